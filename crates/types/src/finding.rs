//! The uniform finding record emitted by every rule.

use crate::{Location, Severity};
use serde::{Deserialize, Serialize};

/// Rule id used for findings synthesised by the runner when a rule fails.
pub const RUNNER_ERROR: &str = "RUNNER_ERROR";

/// One diagnostic emitted by one rule against one template.
///
/// The serialised shape is stable: `rule_id`, `severity`, `message`, `path`,
/// `line`, `column`, and `original_resource` only when the finding was
/// remapped through a SAM source map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// Rule identifier (e.g., `"E3001"`)
    pub rule_id: String,
    /// Severity derived from the rule id
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Path segments locating the offending element
    pub path: Vec<String>,
    /// Line number (1-indexed, 0 if unknown)
    pub line: u32,
    /// Column number (1-indexed, 0 if unknown)
    pub column: u32,
    /// Name of the SAM resource this finding was remapped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_resource: Option<String>,
}

impl Finding {
    /// Create a new finding.
    ///
    /// The severity is taken from the rule id's leading letter; ids that do
    /// not follow the `E`/`W`/`I` scheme are reported as errors.
    #[must_use]
    pub fn new(
        rule_id: impl Into<String>,
        message: impl Into<String>,
        path: Vec<String>,
        location: Location,
    ) -> Self {
        let rule_id = rule_id.into();
        let severity = Severity::from_rule_id(&rule_id).unwrap_or(Severity::Error);
        Self {
            rule_id,
            severity,
            message: message.into(),
            path,
            line: location.line,
            column: location.column,
            original_resource: None,
        }
    }

    /// Create the synthetic finding recorded when a rule fails during evaluation.
    #[must_use]
    pub fn runner_error(failed_rule: &str, failure: &str) -> Self {
        Self {
            rule_id: RUNNER_ERROR.to_string(),
            severity: Severity::Error,
            message: format!("Rule {failed_rule} failed during evaluation: {failure}"),
            path: Vec::new(),
            line: 0,
            column: 0,
            original_resource: None,
        }
    }

    /// Attach the originating SAM resource name.
    #[must_use]
    pub fn with_original_resource(mut self, name: impl Into<String>) -> Self {
        self.original_resource = Some(name.into());
        self
    }

    /// The finding's source location.
    #[must_use]
    pub const fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    /// Replace the finding's source location.
    pub fn set_location(&mut self, location: Location) {
        self.line = location.line;
        self.column = location.column;
    }

    /// Key used to order findings deterministically: `(rule_id, line, column, path)`.
    #[must_use]
    pub fn sort_key(&self) -> (&str, u32, u32, &[String]) {
        (&self.rule_id, self.line, self.column, &self.path)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} ({}) at {}",
            self.rule_id,
            self.severity,
            self.message,
            self.path.join("/"),
            self.location()
        )
    }
}

/// Build an owned path from string segments.
///
/// ```
/// let p = cfn_types::path(&["Resources", "MyBucket"]);
/// assert_eq!(p, vec!["Resources".to_string(), "MyBucket".to_string()]);
/// ```
#[must_use]
pub fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| (*s).to_string()).collect()
}
