use std::fmt;

use crate::error::{A2uiError, Result};

/// A supported A2UI specification version.
///
/// Version dispatch is a closed enum rather than string comparison so that a
/// future dialect is one new variant plus one new bundling arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecVersion {
    /// v0.8: monolithic single-document schemas with injection placeholders.
    V0_8,
    /// v0.9: multi-document schemas resolved through a reference registry.
    V0_9,
}

impl SpecVersion {
    /// Version strings accepted by [`SpecVersion::parse`].
    pub const SUPPORTED: &'static [&'static str] = &["0.8", "0.9"];

    /// Parses a specification version string.
    ///
    /// Rejects unknown versions before any asset I/O is attempted.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "0.8" => Ok(Self::V0_8),
            "0.9" => Ok(Self::V0_9),
            other => Err(A2uiError::UnknownVersion(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V0_8 => "0.8",
            Self::V0_9 => "0.9",
        }
    }

    /// Whether this version splits shared type definitions into a separate
    /// `common_types.json` document. Absent before v0.9.
    pub fn has_common_types(&self) -> bool {
        matches!(self, Self::V0_9)
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_versions() {
        assert_eq!(SpecVersion::parse("0.8").unwrap(), SpecVersion::V0_8);
        assert_eq!(SpecVersion::parse("0.9").unwrap(), SpecVersion::V0_9);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SpecVersion::parse("invalid_version").unwrap_err();
        assert!(err.to_string().contains("Unknown A2UI specification version"));
    }

    #[test]
    fn common_types_only_from_v0_9() {
        assert!(!SpecVersion::V0_8.has_common_types());
        assert!(SpecVersion::V0_9.has_common_types());
    }

    #[test]
    fn supported_list_matches_parse() {
        for raw in SpecVersion::SUPPORTED {
            assert!(SpecVersion::parse(raw).is_ok());
        }
    }
}
