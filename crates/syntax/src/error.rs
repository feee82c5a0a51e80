//! Parse errors produced by the reader.

use cfn_types::Location;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// The class of failure the reader hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// Two entries with the same key in one mapping
    DuplicateKey,
    /// Lexical or structural YAML error
    MalformedYaml,
    /// A `!Tag` that is not a CloudFormation intrinsic or a core YAML tag
    UnknownIntrinsicTag,
    /// The document root is not a mapping
    RootNotMapping,
    /// The input contains no document
    EmptyDocument,
    /// The input contains more than one document
    MultipleDocuments,
    /// The input bytes are not valid UTF-8
    InvalidUtf8,
}

impl ParseErrorKind {
    /// Stable snake-case name of this error kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateKey => "duplicate_key",
            Self::MalformedYaml => "malformed_yaml",
            Self::UnknownIntrinsicTag => "unknown_intrinsic_tag",
            Self::RootNotMapping => "root_not_mapping",
            Self::EmptyDocument => "empty_document",
            Self::MultipleDocuments => "multiple_documents",
            Self::InvalidUtf8 => "invalid_utf8",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reader failure with the source position where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {}, column {})", location.line, location.column)]
pub struct ParseError {
    /// What went wrong
    pub kind: ParseErrorKind,
    /// Where it went wrong
    pub location: Location,
    /// Human-readable description
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    pub(crate) fn duplicate_key(key: &str, location: Location, first: Location) -> Self {
        Self::new(
            ParseErrorKind::DuplicateKey,
            location,
            format!("Duplicate key '{key}' (first defined at line {})", first.line),
        )
    }

    pub(crate) fn malformed(location: Location, message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::MalformedYaml, location, message)
    }
}

impl From<saphyr_parser::ScanError> for ParseError {
    fn from(err: saphyr_parser::ScanError) -> Self {
        let marker = err.marker();
        let location = Location::new(marker.line() as u32, marker.col() as u32 + 1);
        Self::malformed(location, format!("YAML parse error: {}", err.info()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = ParseError::duplicate_key("Bucket", Location::new(7, 3), Location::new(4, 3));
        let text = err.to_string();
        assert!(text.contains("Duplicate key 'Bucket'"));
        assert!(text.contains("line 7, column 3"));
        assert_eq!(err.kind, ParseErrorKind::DuplicateKey);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ParseErrorKind::RootNotMapping.as_str(), "root_not_mapping");
        assert_eq!(format!("{}", ParseErrorKind::UnknownIntrinsicTag), "unknown_intrinsic_tag");
    }
}
