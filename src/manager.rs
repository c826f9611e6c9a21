use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::capabilities::ClientUiCapabilities;
use crate::catalog::Catalog;
use crate::error::{A2uiError, Result};
use crate::loader::{CustomCatalogConfig, SchemaDocumentLoader};
use crate::version::SpecVersion;

/// Name given to catalogs synthesized from client-supplied inline schemas.
pub const INLINE_CATALOG_NAME: &str = "inline";

/// Deployment configuration for a [`SchemaManager`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaManagerConfig {
    /// Additional catalogs registered alongside the basic one.
    #[serde(default)]
    pub custom_catalogs: Vec<CustomCatalogConfig>,
    /// Whether clients may supply catalog schemas inline per request.
    #[serde(default)]
    pub accepts_inline_catalogs: bool,
    /// Directory searched for schema documents not bundled with the crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_root: Option<PathBuf>,
}

/// Per-request knobs for [`SchemaManager::generate_system_prompt`].
///
/// Everything defaults off: the default prompt is the role description
/// alone.
#[derive(Debug, Clone, Default)]
pub struct SystemPromptOptions {
    pub workflow_description: Option<String>,
    pub ui_description: Option<String>,
    pub client_ui_capabilities: Option<ClientUiCapabilities>,
    /// Component names the prompt's catalog is restricted to. Empty means
    /// no restriction.
    pub allowed_components: Vec<String>,
    pub include_schema: bool,
    pub include_examples: bool,
    /// Validate each example document against the catalog before including
    /// it, failing the whole prompt on a bad example.
    pub validate_examples: bool,
    pub examples_path: Option<PathBuf>,
}

/// Owns the catalogs registered for one specification version and answers
/// per-request catalog selection and prompt generation.
#[derive(Debug)]
pub struct SchemaManager {
    version: SpecVersion,
    accepts_inline_catalogs: bool,
    /// Basic catalog first, then custom catalogs in configuration order.
    catalogs: Vec<Arc<Catalog>>,
}

impl SchemaManager {
    /// Builds a manager for `version` with only the basic catalog.
    pub fn new(version: &str) -> Result<Self> {
        Self::with_config(version, &SchemaManagerConfig::default())
    }

    /// Builds a manager for `version` from deployment configuration.
    ///
    /// Every registered catalog, custom ones included, must declare a
    /// `catalogId`; a missing id is a configuration error at startup rather
    /// than a selection error at request time.
    pub fn with_config(version: &str, config: &SchemaManagerConfig) -> Result<Self> {
        let version = SpecVersion::parse(version)?;
        let mut loader = SchemaDocumentLoader::new(version);
        if let Some(root) = &config.assets_root {
            loader = loader.with_assets_root(root);
        }

        let loaded = loader.load(&config.custom_catalogs)?;
        let catalogs: Vec<Arc<Catalog>> = loaded.catalogs.into_iter().map(Arc::new).collect();
        for catalog in &catalogs {
            catalog.catalog_id()?;
        }

        info!(
            %version,
            catalogs = catalogs.len(),
            accepts_inline = config.accepts_inline_catalogs,
            "schema manager initialized"
        );
        Ok(Self {
            version,
            accepts_inline_catalogs: config.accepts_inline_catalogs,
            catalogs,
        })
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// The always-registered standard catalog.
    pub fn basic_catalog(&self) -> &Arc<Catalog> {
        &self.catalogs[0]
    }

    pub fn catalogs(&self) -> &[Arc<Catalog>] {
        &self.catalogs
    }

    /// Selects the catalog to use for a request.
    ///
    /// Absent capabilities, or capabilities naming neither selection mode,
    /// fall back to the basic catalog. Declaring both modes at once is
    /// rejected. Inline catalogs are honored only when enabled in the
    /// manager's configuration; the first inline schema wins. Supported
    /// catalog ids are matched in the client's priority order.
    pub fn determine_catalog(
        &self,
        capabilities: Option<&ClientUiCapabilities>,
    ) -> Result<Arc<Catalog>> {
        let Some(caps) = capabilities else {
            return Ok(Arc::clone(self.basic_catalog()));
        };

        let inline = caps.inline_catalogs();
        let supported = caps.supported_catalog_ids();

        if inline.is_some() && supported.is_some() {
            return Err(A2uiError::Selection(
                "client declared both inline catalogs and supported catalog ids. \
                 Only one is allowed"
                    .to_string(),
            ));
        }

        if let Some(schemas) = inline {
            if !self.accepts_inline_catalogs {
                return Err(A2uiError::Selection(
                    "client supplied inline catalogs but the agent does not accept inline \
                     catalogs"
                        .to_string(),
                ));
            }
            debug!("using client-supplied inline catalog");
            let basic = self.basic_catalog();
            return Ok(Arc::new(Catalog::new(
                self.version,
                INLINE_CATALOG_NAME,
                basic.s2c_schema().clone(),
                basic.common_types_schema().cloned(),
                Catalog::resolve_schema(schemas[0].clone())?,
            )));
        }

        if let Some(ids) = supported {
            for id in ids {
                for catalog in &self.catalogs {
                    if catalog.catalog_id()? == id {
                        debug!(catalog = %catalog.name(), "matched supported catalog id");
                        return Ok(Arc::clone(catalog));
                    }
                }
            }
            return Err(A2uiError::Selection(format!(
                "No supported catalog found among client ids: {ids:?}"
            )));
        }

        Ok(Arc::clone(self.basic_catalog()))
    }

    /// Assembles an LLM system prompt around `role`.
    ///
    /// Sections are emitted in a fixed order and joined by blank lines:
    /// role, workflow description, UI description, examples, schemas. A
    /// section whose content is absent or empty is omitted entirely.
    pub fn generate_system_prompt(
        &self,
        role: &str,
        options: &SystemPromptOptions,
    ) -> Result<String> {
        let catalog = self.determine_catalog(options.client_ui_capabilities.as_ref())?;
        let catalog = catalog.with_pruned_components(&options.allowed_components);

        let mut sections = vec![role.to_string()];

        if let Some(workflow) = &options.workflow_description {
            sections.push(format!("## Workflow Description:\n{workflow}"));
        }
        if let Some(ui) = &options.ui_description {
            sections.push(format!("## UI Description:\n{ui}"));
        }

        if options.include_examples {
            let examples = if options.validate_examples {
                self.load_validated_examples(&catalog, options.examples_path.as_deref())?
            } else {
                catalog.load_examples(options.examples_path.as_deref())?
            };
            if !examples.is_empty() {
                sections.push(format!("### Examples\n{examples}"));
            }
        }

        if options.include_schema {
            sections.push(catalog.render_as_llm_instructions());
        }

        Ok(sections.join("\n\n"))
    }

    /// Like [`Catalog::load_examples`], but parses and validates each
    /// example against the catalog before framing it.
    fn load_validated_examples(
        &self,
        catalog: &Arc<Catalog>,
        path: Option<&Path>,
    ) -> Result<String> {
        let Some(dir) = path else {
            return Ok(String::new());
        };
        if !dir.is_dir() {
            return Ok(String::new());
        }
        let validator = catalog.validator()?;
        let mut out = String::new();
        for (name, contents) in catalog.example_files(dir)? {
            let parsed: serde_json::Value = serde_json::from_str(&contents)?;
            validator.validate(&parsed)?;
            out.push_str(&format!("---BEGIN {name}---\n{contents}\n---END {name}---\n"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn manager_with(accepts_inline: bool, custom_id: Option<&str>) -> SchemaManager {
        let basic = Arc::new(Catalog::new(
            SpecVersion::V0_8,
            "basic",
            json!({"type": "object"}),
            None,
            json!({"catalogId": "id_basic", "components": {}}),
        ));
        let mut catalogs = vec![basic];
        if let Some(id) = custom_id {
            catalogs.push(Arc::new(Catalog::new(
                SpecVersion::V0_8,
                "custom",
                json!({"type": "object"}),
                None,
                json!({"catalogId": id, "components": {}}),
            )));
        }
        SchemaManager {
            version: SpecVersion::V0_8,
            accepts_inline_catalogs: accepts_inline,
            catalogs,
        }
    }

    fn caps(value: Value) -> ClientUiCapabilities {
        ClientUiCapabilities::from_value(&value).unwrap()
    }

    #[test]
    fn no_capabilities_selects_basic() {
        let manager = manager_with(false, None);
        let catalog = manager.determine_catalog(None).unwrap();
        assert!(Arc::ptr_eq(&catalog, manager.basic_catalog()));
    }

    #[test]
    fn empty_capabilities_select_basic() {
        let manager = manager_with(false, None);
        let catalog = manager.determine_catalog(Some(&caps(json!({})))).unwrap();
        assert!(Arc::ptr_eq(&catalog, manager.basic_catalog()));
    }

    #[test]
    fn both_modes_at_once_are_rejected() {
        let manager = manager_with(true, Some("id_custom"));
        let err = manager
            .determine_catalog(Some(&caps(json!({
                "inlineCatalogs": [{"catalogId": "x"}],
                "supportedCatalogIds": ["id_custom"],
            }))))
            .unwrap_err();
        assert!(err.to_string().contains("Only one is allowed"));
    }

    #[test]
    fn inline_rejected_when_not_accepted() {
        let manager = manager_with(false, None);
        let err = manager
            .determine_catalog(Some(&caps(json!({
                "inlineCatalogs": [{"catalogId": "x"}],
            }))))
            .unwrap_err();
        assert!(err.to_string().contains("does not accept inline catalogs"));
    }

    #[test]
    fn inline_accepted_uses_first_schema() {
        let manager = manager_with(true, None);
        let catalog = manager
            .determine_catalog(Some(&caps(json!({
                "inlineCatalogs": [
                    {"catalogId": "id_first", "components": {}},
                    {"catalogId": "id_second", "components": {}},
                ],
            }))))
            .unwrap();
        assert_eq!(catalog.name(), INLINE_CATALOG_NAME);
        assert_eq!(catalog.catalog_id().unwrap(), "id_first");
    }

    #[test]
    fn supported_ids_match_in_client_order() {
        let manager = manager_with(false, Some("id_custom"));
        let catalog = manager
            .determine_catalog(Some(&caps(json!({
                "supportedCatalogIds": ["id_custom", "id_basic"],
            }))))
            .unwrap();
        assert_eq!(catalog.name(), "custom");
    }

    #[test]
    fn unmatched_supported_ids_fail() {
        let manager = manager_with(false, None);
        let err = manager
            .determine_catalog(Some(&caps(json!({
                "supportedCatalogIds": ["id_unknown"],
            }))))
            .unwrap_err();
        assert!(err.to_string().contains("No supported catalog found"));
    }

    #[test]
    fn prompt_sections_in_order_and_omitted_when_empty() {
        let manager = manager_with(false, None);
        let options = SystemPromptOptions {
            workflow_description: Some("Help the user book a flight.".to_string()),
            ui_description: Some("Prefer compact layouts.".to_string()),
            include_schema: true,
            ..SystemPromptOptions::default()
        };
        let prompt = manager.generate_system_prompt("You are a UI agent.", &options).unwrap();

        let role = prompt.find("You are a UI agent.").unwrap();
        let workflow = prompt.find("## Workflow Description:\nHelp the user").unwrap();
        let ui = prompt.find("## UI Description:\nPrefer compact").unwrap();
        let schema = prompt.find("---BEGIN A2UI JSON SCHEMA---").unwrap();
        assert!(role < workflow && workflow < ui && ui < schema);
        assert!(!prompt.contains("### Examples"));
    }

    #[test]
    fn default_prompt_is_just_the_role() {
        let manager = manager_with(false, None);
        let prompt = manager
            .generate_system_prompt("Role only.", &SystemPromptOptions::default())
            .unwrap();
        assert_eq!(prompt, "Role only.");
    }
}
