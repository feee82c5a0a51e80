use crate::error::ConfigError;
use crate::filters::RuleFilters;
use crate::registry::RuleRegistry;
use cfn_sam::TransformContext;
use cfn_types::Severity;
use serde::{Deserialize, Serialize};

/// Lint run configuration
///
/// ```yaml
/// ignore_checks: [W2001, I]
/// include_tags: [parameters]
/// min_severity: warning
/// transform: true
/// sam:
///   region: eu-west-1
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Rule ids or id prefixes that may emit; empty means all
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_checks: Vec<String>,

    /// Rule ids or id prefixes that never emit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore_checks: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_tags: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_tags: Vec<String>,

    /// `informational`, `warning` or `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<String>,

    /// Expand SAM templates before linting
    pub transform: bool,

    /// Values substituted during SAM expansion
    pub sam: TransformContext,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            include_checks: Vec::new(),
            ignore_checks: Vec::new(),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            min_severity: None,
            transform: true,
            sam: TransformContext::default(),
        }
    }
}

impl LintConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(contents).map_err(|e| ConfigError::Yaml {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Json {
            message: e.to_string(),
        })
    }

    /// Check every configured id against `registry`.
    ///
    /// An entry is accepted when it is a registered id or a prefix of one.
    /// Unknown entries are reported with the closest registered id.
    pub fn validate(&self, registry: &RuleRegistry) -> Result<(), ConfigError> {
        let ids = registry.ids();
        for entry in self.include_checks.iter().chain(&self.ignore_checks) {
            if ids.iter().any(|id| id.starts_with(entry.as_str())) {
                continue;
            }
            return Err(ConfigError::UnknownRule {
                id: entry.clone(),
                suggestion: closest_id(entry, &ids).map(str::to_string),
            });
        }
        self.severity().map(|_| ())
    }

    /// The parsed `min_severity`
    pub fn severity(&self) -> Result<Option<Severity>, ConfigError> {
        self.min_severity
            .as_deref()
            .map(|value| {
                value.parse().map_err(|_| ConfigError::InvalidSeverity {
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    /// Runner filters described by this configuration.
    pub fn filters(&self) -> Result<RuleFilters, ConfigError> {
        Ok(RuleFilters {
            include_ids: self.include_checks.clone(),
            exclude_ids: self.ignore_checks.clone(),
            include_tags: self.include_tags.clone(),
            exclude_tags: self.exclude_tags.clone(),
            min_severity: self.severity()?,
        })
    }
}

/// Closest registered id by edit distance, if it is close enough to be a typo.
fn closest_id<'a>(entry: &str, ids: &[&'a str]) -> Option<&'a str> {
    let entry = entry.to_ascii_uppercase();
    ids.iter()
        .map(|id| (*id, strsim::levenshtein(&entry, id)))
        .filter(|(_, distance)| *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(id, _)| id)
}
