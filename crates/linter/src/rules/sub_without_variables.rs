use super::{expression_scopes, report};
use crate::traits::LintRule;
use cfn_template::walk::{find_intrinsic, sub_tokens};
use cfn_template::{Template, Value};
use cfn_types::Finding;

/// Lint rule that flags `Fn::Sub` strings with nothing to substitute.
pub struct SubWithoutVariablesRuleImpl;

impl LintRule for SubWithoutVariablesRuleImpl {
    fn id(&self) -> &'static str {
        "W1020"
    }

    fn short_description(&self) -> &'static str {
        "Sub isn't needed if it doesn't have a variable defined"
    }

    fn description(&self) -> &'static str {
        "Checks sub strings to see if a variable is defined"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-sub.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "sub"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::Sub") {
                let text = match site.operand {
                    Value::String(text) => text,
                    Value::Sequence(items) => match items.first() {
                        Some(Value::String(text)) => text,
                        _ => continue,
                    },
                    _ => continue,
                };
                if sub_tokens(text).is_empty() {
                    findings.push(report(
                        template,
                        self.id(),
                        "Fn::Sub isn't needed because there are no variables",
                        scope.path(&site.path),
                    ));
                }
            }
        }
        findings
    }
}
