use crate::traits::LintRule;
use cfn_types::{Finding, Severity, RUNNER_ERROR};

/// Which rules may run and which findings may be returned.
///
/// Id entries match a rule id exactly or as a prefix, so `W2` selects every
/// `W2xxx` rule and `I` every informational rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilters {
    /// When non-empty, only matching rules may emit
    pub include_ids: Vec<String>,
    pub exclude_ids: Vec<String>,
    /// When non-empty, a rule needs at least one of these tags
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub min_severity: Option<Severity>,
}

impl RuleFilters {
    /// Filters that let everything through
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn include_id(mut self, id: impl Into<String>) -> Self {
        self.include_ids.push(id.into());
        self
    }

    #[must_use]
    pub fn exclude_id(mut self, id: impl Into<String>) -> Self {
        self.exclude_ids.push(id.into());
        self
    }

    #[must_use]
    pub fn include_tag(mut self, tag: impl Into<String>) -> Self {
        self.include_tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn exclude_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclude_tags.push(tag.into());
        self
    }

    #[must_use]
    pub const fn min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    /// Whether findings with this rule id may be returned.
    #[must_use]
    pub fn allows_id(&self, id: &str) -> bool {
        if !self.include_ids.is_empty() && !self.include_ids.iter().any(|entry| id_matches(entry, id)) {
            return false;
        }
        if self.exclude_ids.iter().any(|entry| id_matches(entry, id)) {
            return false;
        }
        match (self.min_severity, Severity::from_rule_id(id)) {
            (Some(min), Some(severity)) => severity >= min,
            _ => true,
        }
    }

    /// Whether `rule` should be evaluated at all.
    #[must_use]
    pub fn allows_rule(&self, rule: &dyn LintRule) -> bool {
        let tags = rule.tags();
        if !self.include_tags.is_empty() && !tags.iter().any(|tag| self.include_tags.iter().any(|t| t == tag)) {
            return false;
        }
        if tags.iter().any(|tag| self.exclude_tags.iter().any(|t| t == tag)) {
            return false;
        }
        self.allows_id(rule.id())
    }

    /// Whether a finding may be returned. Runner failures of rules that were
    /// allowed to run are always kept.
    #[must_use]
    pub fn allows_finding(&self, finding: &Finding) -> bool {
        finding.rule_id == RUNNER_ERROR || self.allows_id(&finding.rule_id)
    }
}

fn id_matches(entry: &str, id: &str) -> bool {
    !entry.is_empty() && id.starts_with(entry)
}
