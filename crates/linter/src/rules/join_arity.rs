use super::{expression_scopes, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::{Template, Value};
use cfn_types::Finding;

/// Lint rule that checks `Fn::Join` is `[delimiter, list]`.
///
/// The list may itself be an intrinsic (`!Split`, `!GetAZs`, a `Ref` to a
/// list parameter), so only literal scalars are rejected there.
pub struct JoinArityRuleImpl;

impl LintRule for JoinArityRuleImpl {
    fn id(&self) -> &'static str {
        "E1022"
    }

    fn short_description(&self) -> &'static str {
        "Join validation of parameters"
    }

    fn description(&self) -> &'static str {
        "Making sure the join function is properly configured"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-join.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "join"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::Join") {
                let message = match site.operand.as_sequence() {
                    Some([delimiter, values]) => {
                        if delimiter.as_str().is_none() {
                            Some("Fn::Join delimiter must be a string".to_string())
                        } else if values.is_scalar() {
                            Some(format!("Fn::Join values must be a list, got {}", values.type_name()))
                        } else if matches!(values, Value::Mapping(_)) && values.as_intrinsic().is_none() {
                            Some("Fn::Join values must be a list, got object".to_string())
                        } else {
                            None
                        }
                    }
                    Some(items) => Some(format!(
                        "Fn::Join must be a list of exactly 2 elements, got {}",
                        items.len()
                    )),
                    None => Some(format!("Fn::Join must be a list, got {}", site.operand.type_name())),
                };
                if let Some(message) = message {
                    findings.push(report(template, self.id(), message, scope.path(&site.path)));
                }
            }
        }
        findings
    }
}
