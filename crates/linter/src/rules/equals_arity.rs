use super::{expression_scopes, list_len, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that checks `Fn::Equals` compares exactly two values.
pub struct EqualsArityRuleImpl;

impl LintRule for EqualsArityRuleImpl {
    fn id(&self) -> &'static str {
        "E8003"
    }

    fn short_description(&self) -> &'static str {
        "Check Fn::Equals structure for validity"
    }

    fn description(&self) -> &'static str {
        "Check Fn::Equals is a list of two elements"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-conditions.html#intrinsic-function-reference-conditions-equals"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "equals"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::Equals") {
                let message = match list_len(site.operand) {
                    Some(2) => continue,
                    Some(count) => format!("Fn::Equals must be a list of exactly 2 elements, got {count}"),
                    None => format!("Fn::Equals must be a list, got {}", site.operand.type_name()),
                };
                findings.push(report(template, self.id(), message, scope.path(&site.path)));
            }
        }
        findings
    }
}
