use super::{expression_scopes, list_len, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::Template;
use cfn_types::Finding;
use std::ops::RangeInclusive;

const CONDITION_COUNT: RangeInclusive<usize> = 2..=10;

/// Lint rule that checks `Fn::And` and `Fn::Or` combine between two and
/// ten conditions.
pub struct AndOrArityRuleImpl;

impl LintRule for AndOrArityRuleImpl {
    fn id(&self) -> &'static str {
        "E8004"
    }

    fn short_description(&self) -> &'static str {
        "Check Fn::And and Fn::Or structure for validity"
    }

    fn description(&self) -> &'static str {
        "Check Fn::And and Fn::Or are lists of between 2 and 10 conditions"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-conditions.html#intrinsic-function-reference-conditions-and"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "and", "or"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for function in ["Fn::And", "Fn::Or"] {
                for site in find_intrinsic(&scope.value, function) {
                    let message = match list_len(site.operand) {
                        Some(count) if CONDITION_COUNT.contains(&count) => continue,
                        Some(count) => format!(
                            "{function} must be a list of between {} and {} elements, got {count}",
                            CONDITION_COUNT.start(),
                            CONDITION_COUNT.end()
                        ),
                        None => format!("{function} must be a list, got {}", site.operand.type_name()),
                    };
                    findings.push(report(template, self.id(), message, scope.path(&site.path)));
                }
            }
        }
        findings
    }
}
