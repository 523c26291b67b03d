//! Error types for manifest handling
//!
//! - Parse operations (text → model)
//! - Validation of parsed models and override maps
//! - Serialize operations (model → text)

use crate::ManifestType;

/// Errors while parsing manifest text
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Manifest text was empty or whitespace only
    #[error("empty {manifest_type} manifest")]
    Empty { manifest_type: ManifestType },

    /// JSON syntax or shape error
    #[error("invalid {manifest_type} manifest at line {line}, column {column}: {message}")]
    Syntax {
        manifest_type: ManifestType,
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    pub(crate) fn from_json(manifest_type: ManifestType, err: &serde_json::Error) -> Self {
        Self::Syntax {
            manifest_type,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }

    /// Manifest type the failing text was parsed as
    #[must_use]
    pub fn manifest_type(&self) -> ManifestType {
        match self {
            Self::Empty { manifest_type } | Self::Syntax { manifest_type, .. } => *manifest_type,
        }
    }
}

/// Errors while serializing a model back to text
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// serde_json refused the model
    #[error("failed to serialize {manifest_type} manifest: {source}")]
    Json {
        manifest_type: ManifestType,
        #[source]
        source: serde_json::Error,
    },
}

/// Semantic validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field required by this manifest type is absent
    #[error("{manifest_type} manifest is missing required field '{field}'")]
    MissingField {
        manifest_type: ManifestType,
        field: &'static str,
    },

    /// A field is present but its value is unusable
    #[error("{manifest_type} manifest has invalid '{field}': {reason}")]
    InvalidField {
        manifest_type: ManifestType,
        field: String,
        reason: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::MissingField`]
    #[must_use]
    pub fn missing(manifest_type: ManifestType, field: &'static str) -> Self {
        Self::MissingField {
            manifest_type,
            field,
        }
    }

    /// Shorthand for [`ValidationError::InvalidField`]
    #[must_use]
    pub fn invalid(
        manifest_type: ManifestType,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            manifest_type,
            field: field.into(),
            reason: reason.into(),
        }
    }
}
