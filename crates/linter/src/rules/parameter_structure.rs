use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{scalar_text, NodeKind, Template};
use cfn_types::Finding;

const PARAMETER_KEYS: &[&str] = &[
    "AllowedPattern",
    "AllowedValues",
    "ConstraintDescription",
    "Default",
    "Description",
    "MaxLength",
    "MaxValue",
    "MinLength",
    "MinValue",
    "NoEcho",
    "Type",
];

/// Lint rule that checks each parameter is a mapping with a `Type` and only
/// known properties, and that its default satisfies `AllowedValues`.
pub struct ParameterStructureRuleImpl;

impl LintRule for ParameterStructureRuleImpl {
    fn id(&self) -> &'static str {
        "E2001"
    }

    fn short_description(&self) -> &'static str {
        "Parameters have appropriate properties"
    }

    fn description(&self) -> &'static str {
        "Making sure the parameters are properly configured"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/parameters-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, parameter) in template.parameters() {
            let path = entity_path("Parameters", name);
            let body = &parameter.declaration.node;
            if body.kind() != NodeKind::Mapping {
                findings.push(report(template, self.id(), format!("Parameter {name} must be an object"), path));
                continue;
            }

            if body.get("Type").is_none() {
                findings.push(report(
                    template,
                    self.id(),
                    format!("Parameter {name} is missing required property Type"),
                    path.clone(),
                ));
            }

            for key in body.keys() {
                if !PARAMETER_KEYS.contains(&key) {
                    let mut key_path = path.clone();
                    key_path.push(key.to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Parameter {name} has invalid property {key}"),
                        key_path,
                    ));
                }
            }

            if let (Some(default), Some(allowed)) = (&parameter.default, &parameter.allowed_values) {
                let default_text = scalar_text(default);
                let allowed_text = || allowed.iter().filter_map(scalar_text);
                if default_text.is_some() && !parameter.is_list() && !allowed_text().any(|text| Some(text) == default_text) {
                    let mut default_path = path.clone();
                    default_path.push("Default".to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Default value of parameter {name} is not one of its AllowedValues"),
                        default_path,
                    ));
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{parse, paths};

    #[test]
    fn test_parameter_structure() {
        let template = parse(
            "\
Parameters:
  Good: {Type: String, Default: a, AllowedValues: [a, b]}
  Numeric: {Type: Number, Default: 1, AllowedValues: ['1', '2']}
  NoType: {Description: x}
  Typo: {Type: String, Defualt: a}
  BadDefault: {Type: String, Default: c, AllowedValues: [a, b]}
  Scalar: hello
Resources: {}
",
        );
        let findings = ParameterStructureRuleImpl.evaluate(&template);
        assert_eq!(
            paths(&findings),
            vec![
                "Parameters/NoType",
                "Parameters/Typo/Defualt",
                "Parameters/BadDefault/Default",
                "Parameters/Scalar",
            ]
        );
    }
}
