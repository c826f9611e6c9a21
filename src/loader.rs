use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{A2uiError, Result};
use crate::version::SpecVersion;

/// File name of the message-envelope schema within a version's asset set.
pub const SERVER_TO_CLIENT_FILE: &str = "server_to_client.json";

/// File name of the standard catalog definition within a version's asset set.
pub const STANDARD_CATALOG_FILE: &str = "standard_catalog_definition.json";

/// File name of the shared type definitions (v0.9+ only).
pub const COMMON_TYPES_FILE: &str = "common_types.json";

/// Name under which the bundled standard catalog is registered.
pub const BASIC_CATALOG_NAME: &str = "basic";

/// A catalog definition supplied by deployment configuration rather than
/// bundled with the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCatalogConfig {
    /// Registration name, used in logs and error messages.
    pub name: String,
    /// Path to the catalog definition JSON document.
    pub catalog_path: PathBuf,
}

/// Schema documents loaded for one specification version.
#[derive(Debug)]
pub struct LoadedSchemas {
    pub server_to_client: Value,
    pub common_types: Option<Value>,
    /// Basic catalog first, then custom catalogs in configuration order.
    pub catalogs: Vec<Catalog>,
}

/// Loads the versioned schema documents a [`Catalog`] is built from.
///
/// Documents bundled at compile time are preferred; a filesystem tree laid
/// out as `<assets_root>/<version>/<file>` serves versions added after this
/// crate was built.
#[derive(Debug, Clone)]
pub struct SchemaDocumentLoader {
    version: SpecVersion,
    assets_root: PathBuf,
}

impl SchemaDocumentLoader {
    pub fn new(version: SpecVersion) -> Self {
        Self { version, assets_root: PathBuf::from("assets") }
    }

    /// Overrides the directory searched when a document is not bundled.
    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    /// Loads the envelope and type documents for this version, builds the
    /// basic catalog from the bundled standard definition, and appends one
    /// catalog per custom configuration entry.
    pub fn load(&self, custom_catalogs: &[CustomCatalogConfig]) -> Result<LoadedSchemas> {
        let server_to_client = self.load_document(SERVER_TO_CLIENT_FILE)?;
        let common_types = if self.version.has_common_types() {
            Some(self.load_document(COMMON_TYPES_FILE)?)
        } else {
            None
        };

        let mut catalogs = Vec::with_capacity(1 + custom_catalogs.len());
        catalogs.push(Catalog::new(
            self.version,
            BASIC_CATALOG_NAME,
            server_to_client.clone(),
            common_types.clone(),
            self.load_document(STANDARD_CATALOG_FILE)?,
        ));

        for config in custom_catalogs {
            debug!(name = %config.name, path = %config.catalog_path.display(), "loading custom catalog");
            let raw = load_json_file(&config.catalog_path)?;
            catalogs.push(Catalog::new(
                self.version,
                config.name.clone(),
                server_to_client.clone(),
                common_types.clone(),
                Catalog::resolve_schema(raw)?,
            ));
        }

        Ok(LoadedSchemas { server_to_client, common_types, catalogs })
    }

    /// Loads a single named document for this version.
    fn load_document(&self, filename: &str) -> Result<Value> {
        if let Some(contents) = embedded_asset(self.version, filename) {
            return Ok(serde_json::from_str(contents)?);
        }
        debug!(version = %self.version, filename, "document not bundled, reading from assets root");
        self.load_from_fs(filename)
    }

    /// Reads a versioned document from the assets root on disk.
    pub(crate) fn load_from_fs(&self, filename: &str) -> Result<Value> {
        let path = self.assets_root.join(self.version.as_str()).join(filename);
        if !path.is_file() {
            return Err(A2uiError::Config(format!(
                "schema document not found: {}",
                path.display()
            )));
        }
        load_json_file(&path)
    }
}

/// Documents compiled into the binary, keyed by version and file name.
fn embedded_asset(version: SpecVersion, filename: &str) -> Option<&'static str> {
    match (version, filename) {
        (SpecVersion::V0_8, SERVER_TO_CLIENT_FILE) => {
            Some(include_str!("../assets/0.8/server_to_client.json"))
        }
        (SpecVersion::V0_8, STANDARD_CATALOG_FILE) => {
            Some(include_str!("../assets/0.8/standard_catalog_definition.json"))
        }
        (SpecVersion::V0_9, SERVER_TO_CLIENT_FILE) => {
            Some(include_str!("../assets/0.9/server_to_client.json"))
        }
        (SpecVersion::V0_9, STANDARD_CATALOG_FILE) => {
            Some(include_str!("../assets/0.9/standard_catalog_definition.json"))
        }
        (SpecVersion::V0_9, COMMON_TYPES_FILE) => {
            Some(include_str!("../assets/0.9/common_types.json"))
        }
        _ => None,
    }
}

fn load_json_file(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
