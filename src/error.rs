/// Errors raised by schema loading, catalog selection and message validation.
#[derive(Debug, thiserror::Error)]
pub enum A2uiError {
    #[error("Unknown A2UI specification version: {0}")]
    UnknownVersion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog '{catalog}' missing catalogId")]
    MissingCatalogId { catalog: String },

    #[error("Catalog selection failed: {0}")]
    Selection(String),

    #[error("Validation failed: {message}{}", format_context(.context))]
    Validation {
        /// Message of the first reported violation.
        message: String,
        /// Nested sub-violations for union (`oneOf`/`anyOf`) failures.
        context: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, A2uiError>;

fn format_context(context: &[String]) -> String {
    if context.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nContext failures:");
    for sub in context {
        out.push_str("\n  - ");
        out.push_str(sub);
    }
    out
}
