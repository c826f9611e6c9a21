use jsonschema::{BasicOutput, Draft, Resource, Validator};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{A2uiError, Result};
use crate::version::SpecVersion;

/// Base URI assumed for multi-document schemas that do not declare an `$id`.
pub const BASE_SCHEMA_URL: &str = "https://a2ui.org/specification/v0_9/server_to_client.json";

const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// How a catalog's documents are combined into one compilable schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlingStrategy {
    /// v0.8: splice catalog definitions into the envelope's placeholder
    /// nodes, producing a single self-contained document.
    Monolithic,
    /// v0.9+: compile the envelope as-is and resolve its relative `$ref`s
    /// through a registry of sibling documents.
    ReferenceRegistry,
}

impl BundlingStrategy {
    pub fn for_version(version: SpecVersion) -> Self {
        match version {
            SpecVersion::V0_8 => Self::Monolithic,
            SpecVersion::V0_9 => Self::ReferenceRegistry,
        }
    }
}

/// A compiled validator for UI message lists against one catalog.
pub struct CatalogValidator {
    strategy: BundlingStrategy,
    compiled: Validator,
}

impl CatalogValidator {
    /// Bundles and compiles the catalog's schema documents.
    pub fn for_catalog(catalog: &Catalog) -> Result<Self> {
        let strategy = BundlingStrategy::for_version(catalog.version());
        debug!(catalog = %catalog.name(), ?strategy, "compiling catalog validator");
        let compiled = match strategy {
            BundlingStrategy::Monolithic => {
                let bundled = bundle_monolithic(catalog.s2c_schema(), catalog.catalog_schema());
                compile(&wrap_message_list(bundled), Vec::new())?
            }
            BundlingStrategy::ReferenceRegistry => build_with_registry(catalog)?,
        };
        Ok(Self { strategy, compiled })
    }

    pub fn strategy(&self) -> BundlingStrategy {
        self.strategy
    }

    /// Validates a JSON list of UI messages.
    ///
    /// On failure, reports the first violation; further violations nested
    /// under the same instance location (the branches of a failed union, in
    /// practice) are attached as context.
    pub fn validate(&self, messages: &Value) -> Result<()> {
        let Some(first) = self.compiled.iter_errors(messages).next() else {
            return Ok(());
        };
        let primary_path = first.instance_path.to_string();
        let message = first.to_string();
        let context = self.sub_violations(messages, &primary_path, &message);
        Err(A2uiError::Validation { message, context })
    }

    /// Violations nested at or under the primary violation's instance
    /// location, the primary itself excluded.
    ///
    /// `iter_errors` collapses a failed `oneOf`/`anyOf` into one aggregate
    /// error, so the per-branch failures are recovered from the basic
    /// output format, which reports every failing keyword individually.
    fn sub_violations(
        &self,
        messages: &Value,
        primary_path: &str,
        primary_message: &str,
    ) -> Vec<String> {
        let BasicOutput::Invalid(units) = self.compiled.apply(messages).basic() else {
            return Vec::new();
        };
        units
            .iter()
            .filter(|unit| {
                let location = unit.instance_location().to_string();
                let description = unit.error_description().to_string();
                pointer_within(&location, primary_path)
                    && !(location == primary_path && description == primary_message)
            })
            .map(|unit| format!("{} at {}", unit.error_description(), unit.instance_location()))
            .collect()
    }
}

/// Whether JSON pointer `path` points at or below `ancestor`, comparing
/// whole segments so `/10` does not count as nested under `/1`.
fn pointer_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Splices catalog definition groups into the envelope's placeholder nodes.
///
/// A placeholder is an object property whose key names a definition group
/// and whose schema declares `additionalProperties: true`. Splicing closes
/// the node (`additionalProperties: false`) and merges the group's entries
/// into its `properties`, the group winning on key collisions. Matched nodes
/// are not descended into.
fn bundle_monolithic(s2c_schema: &Value, catalog_schema: &Value) -> Value {
    let groups = injection_groups(catalog_schema);
    inject_groups(s2c_schema, &groups)
}

/// Definition groups spliceable into a v0.8 envelope, keyed by the
/// placeholder property name they fill.
fn injection_groups(catalog_schema: &Value) -> Map<String, Value> {
    let mut groups = Map::new();
    if let Some(components) = catalog_schema.get("components") {
        groups.insert("component".to_string(), components.clone());
    }
    if let Some(styles) = catalog_schema.get("styles") {
        groups.insert("styles".to_string(), styles.clone());
    }
    groups
}

fn inject_groups(node: &Value, groups: &Map<String, Value>) -> Value {
    match node {
        Value::Object(map) => {
            let mut rebuilt = Map::with_capacity(map.len());
            for (key, value) in map {
                let injected = match groups.get(key) {
                    Some(group) if is_open_placeholder(value) => close_node(value, group),
                    _ => inject_groups(value, groups),
                };
                rebuilt.insert(key.clone(), injected);
            }
            Value::Object(rebuilt)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| inject_groups(item, groups)).collect())
        }
        other => other.clone(),
    }
}

fn is_open_placeholder(value: &Value) -> bool {
    value.get("additionalProperties") == Some(&Value::Bool(true))
}

fn close_node(node: &Value, group: &Value) -> Value {
    let mut closed = node.as_object().cloned().unwrap_or_default();
    closed.insert("additionalProperties".to_string(), Value::Bool(false));
    let mut properties = closed
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if let Some(entries) = group.as_object() {
        for (name, schema) in entries {
            properties.insert(name.clone(), schema.clone());
        }
    }
    closed.insert("properties".to_string(), Value::Object(properties));
    Value::Object(closed)
}

/// Messages arrive as a JSON list; the envelope schema describes one message.
fn wrap_message_list(schema: Value) -> Value {
    json!({
        "type": "array",
        "items": schema,
    })
}

/// Compiles the v0.9+ envelope with its sibling documents registered so the
/// relative `$ref`s (`catalog.json#/...`, `common_types.json#/...`) resolve.
fn build_with_registry(catalog: &Catalog) -> Result<Validator> {
    let base_uri = catalog
        .s2c_schema()
        .get("$id")
        .and_then(Value::as_str)
        .unwrap_or(BASE_SCHEMA_URL)
        .to_string();

    let mut wrapped = wrap_message_list(catalog.s2c_schema().clone());
    if let Some(obj) = wrapped.as_object_mut() {
        obj.insert("$schema".to_string(), Value::String(DRAFT_2020_12.to_string()));
    }

    compile(&wrapped, registry_resources(catalog, &base_uri))
}

/// The documents the envelope may reference, each under every URI a `$ref`
/// could spell it as: the URI sibling to the envelope's `$id`, the bare
/// relative file name, and (for the catalog) its declared `catalogId`.
fn registry_resources(catalog: &Catalog, base_uri: &str) -> Vec<(String, Value)> {
    let mut resources = Vec::new();

    let catalog_uri = sibling_uri(base_uri, "catalog.json");
    resources.push((catalog_uri.clone(), catalog.catalog_schema().clone()));
    resources.push(("catalog.json".to_string(), catalog.catalog_schema().clone()));

    if let Some(common_types) = catalog.common_types_schema() {
        resources.push((sibling_uri(base_uri, "common_types.json"), common_types.clone()));
        resources.push(("common_types.json".to_string(), common_types.clone()));
    }

    if let Some(declared) = catalog.catalog_schema().get("catalogId").and_then(Value::as_str) {
        if declared != catalog_uri {
            resources.push((declared.to_string(), catalog.catalog_schema().clone()));
        }
    }

    resources
}

/// Replaces the final path segment of `base` with `filename`.
fn sibling_uri(base: &str, filename: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], filename),
        None => filename.to_string(),
    }
}

fn compile(schema: &Value, resources: Vec<(String, Value)>) -> Result<Validator> {
    let mut options = jsonschema::options().with_draft(Draft::Draft202012);
    for (uri, contents) in resources {
        options = options.with_resource(uri, Resource::from_contents(contents));
    }
    options
        .build(schema)
        .map_err(|e| A2uiError::Config(format!("schema compilation failed: {e}")))
}
