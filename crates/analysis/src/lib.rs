//! # CloudFormation Analysis
//!
//! The one-call pipeline over a template's source: read it, expand it when
//! it uses the SAM transform, and run the rule engine over the result.
//!
//! Failures to read or expand the template are not returned as errors.
//! Each becomes a single finding (`E0000` for the reader, `E0001` for the
//! expander) positioned where the failure happened, and no rule runs.

use cfn_linter::{builtin_registry, ConfigError, LintConfig, Linter, RuleFilters};
use cfn_sam::{is_sam_template, transform, TransformContext, TransformError};
use cfn_template::{ParseError, Template};
use cfn_types::Finding;

/// Rule id of the finding reported for a template that cannot be read
pub const PARSE_ERROR: &str = "E0000";

/// Rule id of the finding reported for a template SAM cannot expand
pub const TRANSFORM_ERROR: &str = "E0001";

/// What to run and how to expand SAM templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub filters: RuleFilters,
    /// Expand SAM templates before linting; when off they are linted as written
    pub transform: bool,
    pub context: TransformContext,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            filters: RuleFilters::default(),
            transform: true,
            context: TransformContext::default(),
        }
    }
}

impl AnalysisOptions {
    /// Options from a validated configuration.
    pub fn from_config(config: &LintConfig) -> Result<Self, ConfigError> {
        config.validate(builtin_registry())?;
        Ok(Self {
            filters: config.filters()?,
            transform: config.transform,
            context: config.sam.clone(),
        })
    }
}

/// How far the pipeline got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisStatus {
    /// Every rule ran and none reported anything
    Clean,
    /// Every rule ran and at least one reported
    Findings,
    /// The source is not a readable template
    ParseFailed,
    /// The template uses SAM and could not be expanded
    TransformFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub findings: Vec<Finding>,
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    fn linted(findings: Vec<Finding>) -> Self {
        let status = if findings.is_empty() {
            AnalysisStatus::Clean
        } else {
            AnalysisStatus::Findings
        };
        Self { findings, status }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.status == AnalysisStatus::Clean
    }

    /// Whether any finding is an error
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|finding| finding.severity == cfn_types::Severity::Error)
    }
}

/// Analyze template source text.
#[must_use]
#[tracing::instrument(skip(source, options), fields(bytes = source.len()))]
pub fn analyze(source: &str, filename: &str, options: &AnalysisOptions) -> AnalysisResult {
    match Template::from_source(source, filename) {
        Ok(template) => analyze_template(&template, options),
        Err(err) => parse_failed(&err),
    }
}

/// Analyze raw template bytes; input that is not UTF-8 is a parse failure.
#[must_use]
#[tracing::instrument(skip(bytes, options), fields(bytes = bytes.len()))]
pub fn analyze_bytes(bytes: &[u8], filename: &str, options: &AnalysisOptions) -> AnalysisResult {
    match Template::from_bytes(bytes, filename) {
        Ok(template) => analyze_template(&template, options),
        Err(err) => parse_failed(&err),
    }
}

/// Analyze an already-read template.
#[must_use]
pub fn analyze_template(template: &Template, options: &AnalysisOptions) -> AnalysisResult {
    let linter = Linter::new(options.filters.clone());

    if !(options.transform && is_sam_template(template)) {
        return AnalysisResult::linted(linter.lint(template));
    }

    tracing::debug!(file = %template.source_filename, "Expanding SAM template");
    match transform(template, &options.context) {
        Ok(transformed) => {
            AnalysisResult::linted(linter.lint_mapped(&transformed.template, Some(&transformed.source_map)))
        }
        Err(err) => transform_failed(template, &err),
    }
}

fn parse_failed(err: &ParseError) -> AnalysisResult {
    tracing::debug!(error = %err, "Template could not be read");
    AnalysisResult {
        findings: vec![Finding::new(PARSE_ERROR, err.message.clone(), Vec::new(), err.location)],
        status: AnalysisStatus::ParseFailed,
    }
}

fn transform_failed(template: &Template, err: &TransformError) -> AnalysisResult {
    tracing::debug!(error = %err, "SAM expansion failed");
    let location = err.location().unwrap_or_else(|| template.location_of(&["Transform"]));
    AnalysisResult {
        findings: vec![Finding::new(TRANSFORM_ERROR, err.to_string(), Vec::new(), location)],
        status: AnalysisStatus::TransformFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_types::Location;

    #[test]
    fn test_from_config() {
        let config = LintConfig::from_yaml_str("ignore_checks: [W2]\ntransform: false\n").unwrap();
        let options = AnalysisOptions::from_config(&config).unwrap();
        assert_eq!(options.filters.exclude_ids, vec!["W2".to_string()]);
        assert!(!options.transform);
    }

    #[test]
    fn test_from_config_rejects_unknown_rules() {
        let config = LintConfig::from_yaml_str("include_checks: [E9999]\n").unwrap();
        assert!(matches!(
            AnalysisOptions::from_config(&config),
            Err(ConfigError::UnknownRule { .. })
        ));
    }

    #[test]
    fn test_result_status() {
        let clean = AnalysisResult::linted(Vec::new());
        assert!(clean.is_clean());
        assert!(!clean.has_errors());

        let warning = Finding::new("W2001", "unused", Vec::new(), Location::new(2, 3));
        let result = AnalysisResult::linted(vec![warning]);
        assert_eq!(result.status, AnalysisStatus::Findings);
        assert!(!result.has_errors());
    }
}
