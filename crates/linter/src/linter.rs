use crate::filters::RuleFilters;
use crate::mapper::map_positions;
use crate::registry::{builtin_registry, RuleRegistry};
use crate::traits::LintRule;
use cfn_sam::SourceMap;
use cfn_template::Template;
use cfn_types::Finding;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs the rules of a registry over templates.
#[derive(Debug, Clone)]
pub struct Linter<'r> {
    registry: &'r RuleRegistry,
    filters: RuleFilters,
}

impl Linter<'static> {
    /// A linter over the built-in catalog
    #[must_use]
    pub fn new(filters: RuleFilters) -> Self {
        Self::with_registry(builtin_registry(), filters)
    }
}

impl<'r> Linter<'r> {
    #[must_use]
    pub const fn with_registry(registry: &'r RuleRegistry, filters: RuleFilters) -> Self {
        Self { registry, filters }
    }

    #[must_use]
    pub const fn filters(&self) -> &RuleFilters {
        &self.filters
    }

    /// Lint a template read straight from source.
    #[must_use]
    pub fn lint(&self, template: &Template) -> Vec<Finding> {
        self.lint_mapped(template, None)
    }

    /// Lint a template, remapping positions through `source_map` when the
    /// template is the output of a SAM expansion.
    ///
    /// Findings are sorted by `(rule_id, line, column, path)` and exact
    /// duplicates are dropped. A rule that panics yields one `RUNNER_ERROR`
    /// finding instead of aborting the run.
    #[must_use]
    #[tracing::instrument(skip_all, fields(file = %template.source_filename))]
    pub fn lint_mapped(&self, template: &Template, source_map: Option<&SourceMap>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in self.registry.rules() {
            let rule_id = rule.id();
            if !self.filters.allows_rule(&**rule) {
                tracing::trace!(rule = rule_id, "Rule filtered out, skipping");
                continue;
            }

            tracing::trace!(rule = rule_id, "Running rule");
            let rule_findings = evaluate_isolated(&**rule, template);
            if !rule_findings.is_empty() {
                tracing::debug!(rule = rule_id, findings = rule_findings.len(), "Rule found issues");
            }
            findings.extend(rule_findings);
        }

        findings.retain(|finding| self.filters.allows_finding(finding));
        let mut findings = map_positions(findings, source_map);
        findings.sort_by(|a, b| {
            a.sort_key()
                .cmp(&b.sort_key())
                .then_with(|| a.message.cmp(&b.message))
                .then_with(|| a.original_resource.cmp(&b.original_resource))
        });
        findings.dedup();

        tracing::debug!(total_findings = findings.len(), "Linting complete");
        findings
    }
}

/// Run the built-in catalog over `template`.
#[must_use]
pub fn run(template: &Template, filters: &RuleFilters) -> Vec<Finding> {
    Linter::new(filters.clone()).lint(template)
}

fn evaluate_isolated(rule: &dyn LintRule, template: &Template) -> Vec<Finding> {
    match catch_unwind(AssertUnwindSafe(|| rule.evaluate(template))) {
        Ok(findings) => findings,
        Err(payload) => {
            let failure = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(rule = rule.id(), failure = %failure, "Rule failed during evaluation");
            vec![Finding::runner_error(rule.id(), &failure)]
        }
    }
}
