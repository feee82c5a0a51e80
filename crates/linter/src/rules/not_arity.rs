use super::{expression_scopes, list_len, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that checks `Fn::Not` negates exactly one condition.
pub struct NotArityRuleImpl;

impl LintRule for NotArityRuleImpl {
    fn id(&self) -> &'static str {
        "E8005"
    }

    fn short_description(&self) -> &'static str {
        "Check Fn::Not structure for validity"
    }

    fn description(&self) -> &'static str {
        "Check Fn::Not is a list of one element"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-conditions.html#intrinsic-function-reference-conditions-not"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "not"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::Not") {
                let message = match list_len(site.operand) {
                    Some(1) => continue,
                    Some(count) => format!("Fn::Not must be a list of exactly 1 element, got {count}"),
                    None => format!("Fn::Not must be a list, got {}", site.operand.type_name()),
                };
                findings.push(report(template, self.id(), message, scope.path(&site.path)));
            }
        }
        findings
    }
}
