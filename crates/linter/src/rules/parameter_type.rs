use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;
use regex::Regex;
use std::sync::LazyLock;

/// Parameter types CloudFormation accepts
static PARAMETER_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(String|Number|CommaDelimitedList|List<Number>|AWS::[A-Za-z0-9]+::[A-Za-z0-9]+::[A-Za-z0-9:.]+|List<AWS::[A-Za-z0-9]+::[A-Za-z0-9]+::[A-Za-z0-9:.]+>|AWS::SSM::Parameter::(Name|Value<.+>))$",
    )
    .unwrap_or_else(|err| panic!("parameter type pattern is invalid: {err}"))
});

/// Lint rule that checks each parameter `Type` is a type CloudFormation
/// accepts.
pub struct ParameterTypeRuleImpl;

impl LintRule for ParameterTypeRuleImpl {
    fn id(&self) -> &'static str {
        "E2002"
    }

    fn short_description(&self) -> &'static str {
        "Parameters have appropriate type"
    }

    fn description(&self) -> &'static str {
        "Making sure the parameters have a correct type"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/parameters-section-structure.html#parameters-section-structure-properties"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        template
            .parameters()
            .filter(|(_, parameter)| parameter.declaration.node.get("Type").is_some())
            .filter(|(_, parameter)| !PARAMETER_TYPE.is_match(&parameter.parameter_type))
            .map(|(name, parameter)| {
                let mut path = entity_path("Parameters", name);
                path.push("Type".to_string());
                report(
                    template,
                    self.id(),
                    format!("Parameter {name} has invalid type {}", parameter.parameter_type),
                    path,
                )
            })
            .collect()
    }
}
