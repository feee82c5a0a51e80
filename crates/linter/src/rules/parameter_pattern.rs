use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{Template, Value};
use cfn_types::Finding;
use regex::Regex;

/// Lint rule that checks `AllowedPattern` is a valid regular expression and
/// that a literal `Default` matches it.
pub struct ParameterPatternRuleImpl;

impl LintRule for ParameterPatternRuleImpl {
    fn id(&self) -> &'static str {
        "E2003"
    }

    fn short_description(&self) -> &'static str {
        "Parameters have valid AllowedPattern"
    }

    fn description(&self) -> &'static str {
        "Checks that AllowedPattern compiles and that the default value matches it"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/parameters-section-structure.html#parameters-section-structure-properties-allowedpattern"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, parameter) in template.parameters() {
            let Some(pattern) = &parameter.allowed_pattern else {
                continue;
            };
            let mut path = entity_path("Parameters", name);
            match Regex::new(&format!("^(?:{pattern})$")) {
                Err(err) => {
                    path.push("AllowedPattern".to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("AllowedPattern of parameter {name} is not a valid regular expression: {err}"),
                        path,
                    ));
                }
                Ok(regex) => {
                    let default = parameter.default.as_ref().and_then(Value::as_str);
                    if let Some(default) = default {
                        if !regex.is_match(default) {
                            path.push("Default".to_string());
                            findings.push(report(
                                template,
                                self.id(),
                                format!("Default value of parameter {name} does not match AllowedPattern"),
                                path,
                            ));
                        }
                    }
                }
            }
        }
        findings
    }
}
