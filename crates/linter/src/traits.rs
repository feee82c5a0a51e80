use cfn_template::Template;
use cfn_types::{Finding, Severity};

/// A single check over a parsed template.
///
/// Rules are stateless: `evaluate` reads the template and returns findings,
/// and must give the same answer every time it is called. The id's leading
/// letter decides the severity of everything the rule reports.
pub trait LintRule: Send + Sync {
    /// Unique identifier, `E`/`W`/`I` followed by four digits (e.g. `"E3001"`)
    fn id(&self) -> &'static str;

    /// One-line summary
    fn short_description(&self) -> &'static str;

    /// Longer explanation of what the rule checks
    fn description(&self) -> &'static str;

    /// Link to documentation for the checked behaviour
    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/template-anatomy.html"
    }

    /// Free-form tags used for filtering (e.g. `"parameters"`)
    fn tags(&self) -> &'static [&'static str];

    /// Check the template
    fn evaluate(&self, template: &Template) -> Vec<Finding>;

    /// Severity derived from the id
    fn severity(&self) -> Severity {
        Severity::from_rule_id(self.id()).unwrap_or(Severity::Error)
    }
}
