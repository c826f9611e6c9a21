//! Schema management core for the A2UI protocol.
//!
//! Loads versioned schema documents, registers component catalogs, selects a
//! catalog per client capabilities, validates UI message lists against it,
//! and renders LLM system prompts carrying the catalog's schemas.

pub mod capabilities;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod manager;
pub mod validator;
pub mod version;

pub use capabilities::{
    A2UI_EXTENSION_URI, ClientUiCapabilities, INLINE_CATALOGS_KEY, SUPPORTED_CATALOG_IDS_KEY,
};
pub use catalog::Catalog;
pub use error::{A2uiError, Result};
pub use loader::{
    BASIC_CATALOG_NAME, COMMON_TYPES_FILE, CustomCatalogConfig, LoadedSchemas,
    SERVER_TO_CLIENT_FILE, STANDARD_CATALOG_FILE, SchemaDocumentLoader,
};
pub use manager::{INLINE_CATALOG_NAME, SchemaManager, SchemaManagerConfig, SystemPromptOptions};
pub use validator::{BASE_SCHEMA_URL, BundlingStrategy, CatalogValidator};
pub use version::SpecVersion;
