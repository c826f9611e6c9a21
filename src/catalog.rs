use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::error::{A2uiError, Result};
use crate::validator::CatalogValidator;
use crate::version::SpecVersion;

/// A named, versioned set of component and style definitions plus the
/// message-envelope schemas needed to validate UI messages against it.
///
/// Catalogs are immutable after construction. Pruning returns a new catalog,
/// and the compiled validator is built lazily and cached per instance, so a
/// catalog can be shared freely across concurrent prompt-generation calls.
pub struct Catalog {
    version: SpecVersion,
    name: String,
    s2c_schema: Value,
    common_types_schema: Option<Value>,
    catalog_schema: Value,
    validator: OnceLock<Arc<CatalogValidator>>,
}

impl Catalog {
    pub fn new(
        version: SpecVersion,
        name: impl Into<String>,
        s2c_schema: Value,
        common_types_schema: Option<Value>,
        catalog_schema: Value,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            s2c_schema,
            common_types_schema,
            catalog_schema,
            validator: OnceLock::new(),
        }
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn s2c_schema(&self) -> &Value {
        &self.s2c_schema
    }

    pub fn common_types_schema(&self) -> Option<&Value> {
        self.common_types_schema.as_ref()
    }

    pub fn catalog_schema(&self) -> &Value {
        &self.catalog_schema
    }

    /// The `catalogId` declared by the catalog schema.
    ///
    /// Missing ids are an error, not a silent default; transient inline
    /// catalogs are the only documents expected to omit one.
    pub fn catalog_id(&self) -> Result<&str> {
        self.catalog_schema
            .get("catalogId")
            .and_then(Value::as_str)
            .ok_or_else(|| A2uiError::MissingCatalogId { catalog: self.name.clone() })
    }

    /// Returns a catalog restricted to the named components.
    ///
    /// An empty allow-list means "no restriction" and returns the same
    /// instance (observable through `Arc::ptr_eq`). Otherwise the result's
    /// `components` map is the intersection of the original keys and the
    /// allow-list, and any `$defs.anyComponent.oneOf` entries are filtered to
    /// the surviving components, preserving their relative order. Styles,
    /// common defs and the message envelope are untouched.
    pub fn with_pruned_components(self: &Arc<Self>, allowed: &[String]) -> Arc<Catalog> {
        if allowed.is_empty() {
            return Arc::clone(self);
        }

        let mut catalog_schema = self.catalog_schema.clone();
        if let Some(components) =
            catalog_schema.get_mut("components").and_then(Value::as_object_mut)
        {
            components.retain(|name, _| allowed.iter().any(|a| a == name));
        }

        let kept: Vec<String> = catalog_schema
            .get("components")
            .and_then(Value::as_object)
            .map(|components| components.keys().cloned().collect())
            .unwrap_or_default();

        if let Some(one_of) = catalog_schema
            .pointer_mut("/$defs/anyComponent/oneOf")
            .and_then(Value::as_array_mut)
        {
            one_of.retain(|entry| {
                entry
                    .get("$ref")
                    .and_then(Value::as_str)
                    .and_then(|reference| reference.rsplit('/').next())
                    .map(|name| kept.iter().any(|k| k == name))
                    .unwrap_or(true)
            });
        }

        Arc::new(Catalog::new(
            self.version,
            self.name.clone(),
            self.s2c_schema.clone(),
            self.common_types_schema.clone(),
            catalog_schema,
        ))
    }

    /// Concatenates every `*.json` file directly inside `path` into one
    /// string, each example framed by `---BEGIN <name>---` / `---END <name>---`
    /// markers, in file-name order.
    ///
    /// `None` or a path that is not a directory yields the empty string:
    /// "no examples available" is a designed empty result, not a failure.
    pub fn load_examples(&self, path: Option<&Path>) -> Result<String> {
        let Some(dir) = path else {
            return Ok(String::new());
        };
        if !dir.is_dir() {
            return Ok(String::new());
        }
        let mut out = String::new();
        for (name, contents) in self.example_files(dir)? {
            out.push_str(&frame_example(&name, &contents));
        }
        Ok(out)
    }

    /// Reads the example documents of a directory as `(name, contents)`
    /// pairs, sorted by file name. Non-`.json` entries are ignored.
    pub(crate) fn example_files(&self, dir: &Path) -> Result<Vec<(String, String)>> {
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json")
            })
            .collect();
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_string();
            files.push((name, fs::read_to_string(&path)?));
        }
        Ok(files)
    }

    /// Renders the catalog's schemas as a fenced instruction block for an
    /// LLM system prompt.
    ///
    /// The literal section markers are a contract consumed by downstream
    /// prompt-parsing logic. Pretty-printing is deterministic (sorted keys,
    /// two-space indent) so output is stable for golden-file tests.
    pub fn render_as_llm_instructions(&self) -> String {
        let mut out = String::from("---BEGIN A2UI JSON SCHEMA---\n");
        out.push_str("### Server To Client Schema:\n");
        out.push_str(&pretty(&self.s2c_schema));
        out.push('\n');
        if let Some(common_types) = &self.common_types_schema {
            out.push_str("\n### Common Types Schema:\n");
            out.push_str(&pretty(common_types));
            out.push('\n');
        }
        out.push_str("\n### Catalog Schema:\n");
        out.push_str(&pretty(&self.catalog_schema));
        out.push_str("\n---END A2UI JSON SCHEMA---");
        out
    }

    /// Normalizes a raw client- or config-supplied catalog schema into the
    /// representation used internally. Non-object documents are rejected.
    pub fn resolve_schema(raw: Value) -> Result<Value> {
        if raw.is_object() {
            Ok(raw)
        } else {
            Err(A2uiError::Config("catalog schema must be a JSON object".to_string()))
        }
    }

    /// The compiled validator for this catalog, built on first access.
    ///
    /// Two callers racing on first access may both build; construction is
    /// pure, so either result is equivalent and the duplicate is discarded.
    pub fn validator(&self) -> Result<Arc<CatalogValidator>> {
        if let Some(validator) = self.validator.get() {
            return Ok(Arc::clone(validator));
        }
        let built = Arc::new(CatalogValidator::for_catalog(self)?);
        let _ = self.validator.set(Arc::clone(&built));
        Ok(built)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("version", &self.version)
            .field("name", &self.name)
            .field("catalog_id", &self.catalog_schema.get("catalogId"))
            .finish_non_exhaustive()
    }
}

fn frame_example(name: &str, contents: &str) -> String {
    format!("---BEGIN {name}---\n{contents}\n---END {name}---\n")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
