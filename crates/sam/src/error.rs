use cfn_template::ParseError;
use cfn_types::Location;

/// A failure reported by a macro expander.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExpansionError {
    pub message: String,
    /// The logical ID the failure concerns, when known
    pub logical_id: Option<String>,
}

impl ExpansionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            logical_id: None,
        }
    }

    /// An error about one resource, worded the way the transform reports it.
    #[must_use]
    pub fn invalid_resource(logical_id: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            message: format!("Resource with id [{logical_id}] is invalid. {reason}"),
            logical_id: Some(logical_id.to_string()),
        }
    }
}

/// Why a SAM template could not be transformed.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The template could not be re-serialised for the expander
    #[error("Failed to serialize template: {message}")]
    Serialization { message: String },

    /// The expander rejected the template
    #[error("Error transforming template: {message}")]
    Expansion {
        message: String,
        location: Option<Location>,
    },

    /// The expander's output is not a readable template. `location` is the
    /// original template's `Transform` key; the parse error's own position
    /// is in the expanded output.
    #[error("Transformed template could not be read: {source}")]
    Reparse {
        source: ParseError,
        location: Location,
    },
}

impl TransformError {
    /// Source position of the failure, when one is known.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Serialization { .. } => None,
            Self::Expansion { location, .. } => *location,
            Self::Reparse { location, .. } => Some(*location),
        }
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
