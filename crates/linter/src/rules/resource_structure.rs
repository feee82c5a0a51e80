use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{NodeKind, Template};
use cfn_types::Finding;

const RESOURCE_ATTRIBUTES: &[&str] = &[
    "Condition",
    "CreationPolicy",
    "DeletionPolicy",
    "DependsOn",
    "Description",
    "Metadata",
    "Properties",
    "Type",
    "UpdatePolicy",
    "UpdateReplacePolicy",
    "Version",
];

/// Lint rule that checks each resource is a mapping with a string `Type`,
/// only known attributes and an object `Properties`.
pub struct ResourceStructureRuleImpl;

impl LintRule for ResourceStructureRuleImpl {
    fn id(&self) -> &'static str {
        "E3001"
    }

    fn short_description(&self) -> &'static str {
        "Basic CloudFormation Resource Check"
    }

    fn description(&self) -> &'static str {
        "Making sure the basic CloudFormation resources are properly configured"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/resources-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, resource) in template.resources() {
            let path = entity_path("Resources", name);
            let body = &resource.declaration.node;
            if body.kind() != NodeKind::Mapping {
                findings.push(report(template, self.id(), format!("Resource {name} must be an object"), path));
                continue;
            }

            match body.get("Type") {
                None => findings.push(report(
                    template,
                    self.id(),
                    format!("Resource {name} is missing required property Type"),
                    path.clone(),
                )),
                Some(node) if node.as_str().is_none_or(str::is_empty) => {
                    let mut type_path = path.clone();
                    type_path.push("Type".to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Type of resource {name} must be a non-empty string"),
                        type_path,
                    ));
                }
                Some(_) => {}
            }

            for key in body.keys() {
                if !RESOURCE_ATTRIBUTES.contains(&key) {
                    let mut key_path = path.clone();
                    key_path.push(key.to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Invalid resource attribute {key} for resource {name}"),
                        key_path,
                    ));
                }
            }

            if let Some(properties) = body.get("Properties") {
                if properties.kind() != NodeKind::Mapping {
                    let mut properties_path = path;
                    properties_path.push("Properties".to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Properties of resource {name} must be an object"),
                        properties_path,
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
    fn test_well_formed_resource() {
        let template = parse(
            "Resources:\n  B:\n    Type: AWS::S3::Bucket\n    DeletionPolicy: Retain\n    Properties: {}\n",
        );
        assert!(ResourceStructureRuleImpl.evaluate(&template).is_empty());
    }

    #[test]
    fn test_malformed_resources() {
        let template = parse(
            "\
Resources:
  NoType:
    Properties: {}
  Listy: [a]
  Odd:
    Type: AWS::SNS::Topic
    Propertes: {}
    Properties: [x]
  Numbered:
    Type: 42
",
        );
        let findings = ResourceStructureRuleImpl.evaluate(&template);
        assert_eq!(
            paths(&findings),
            vec![
                "Resources/NoType",
                "Resources/Listy",
                "Resources/Odd/Propertes",
                "Resources/Odd/Properties",
                "Resources/Numbered/Type",
            ]
        );
        assert_eq!(findings[2].message, "Invalid resource attribute Propertes for resource Odd");
        assert_eq!(findings[2].location(), cfn_types::Location::new(7, 5));
    }
}
