use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// URI identifying the A2UI extension in an agent card.
pub const A2UI_EXTENSION_URI: &str = "https://a2ui.org/specification/extensions/a2ui";

/// Capability key carrying client-supplied catalog schemas.
pub const INLINE_CATALOGS_KEY: &str = "inlineCatalogs";

/// Capability key carrying the catalog ids the client can render.
pub const SUPPORTED_CATALOG_IDS_KEY: &str = "supportedCatalogIds";

/// UI capabilities declared by a client for one request.
///
/// The two selection modes are mutually exclusive; enforcement lives in
/// [`SchemaManager::determine_catalog`](crate::manager::SchemaManager::determine_catalog).
/// Unknown keys in the wire object are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientUiCapabilities {
    /// Raw catalog schemas supplied by the client at request time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_catalogs: Option<Vec<Value>>,
    /// Ids of pre-registered catalogs the client supports, in priority order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_catalog_ids: Option<Vec<String>>,
}

impl ClientUiCapabilities {
    /// Parses a capability object from its JSON wire form.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Inline catalog schemas, treating an empty list as "not supplied".
    pub fn inline_catalogs(&self) -> Option<&[Value]> {
        self.inline_catalogs.as_deref().filter(|list| !list.is_empty())
    }

    /// Supported catalog ids, treating an empty list as "not supplied".
    pub fn supported_catalog_ids(&self) -> Option<&[String]> {
        self.supported_catalog_ids.as_deref().filter(|list| !list.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_camel_case_wire_keys() {
        let caps = ClientUiCapabilities::from_value(&json!({
            "supportedCatalogIds": ["id_custom1", "id_custom2"],
        }))
        .unwrap();
        assert_eq!(
            caps.supported_catalog_ids(),
            Some(&["id_custom1".to_string(), "id_custom2".to_string()][..])
        );
        assert!(caps.inline_catalogs().is_none());
    }

    #[test]
    fn parses_inline_catalogs() {
        let caps = ClientUiCapabilities::from_value(&json!({
            "inlineCatalogs": [{"catalogId": "id_inline", "components": {}}],
        }))
        .unwrap();
        assert_eq!(caps.inline_catalogs().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn ignores_unknown_keys() {
        let caps = ClientUiCapabilities::from_value(&json!({
            "someFutureKey": true,
        }))
        .unwrap();
        assert!(caps.inline_catalogs().is_none());
        assert!(caps.supported_catalog_ids().is_none());
    }

    #[test]
    fn empty_lists_count_as_absent() {
        let caps = ClientUiCapabilities::from_value(&json!({
            "inlineCatalogs": [],
            "supportedCatalogIds": [],
        }))
        .unwrap();
        assert!(caps.inline_catalogs().is_none());
        assert!(caps.supported_catalog_ids().is_none());
    }
}
