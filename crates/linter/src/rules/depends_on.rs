use super::{closest, entity_path, report};
use crate::traits::LintRule;
use cfn_template::{Node, NodeKind, Template};
use cfn_types::Finding;

/// Lint rule that checks every `DependsOn` entry names another resource.
pub struct DependsOnRuleImpl;

impl DependsOnRuleImpl {
    /// `(name, relative path)` for each entry of a scalar or list `DependsOn`
    fn entries(node: &Node) -> Vec<(Option<&str>, Vec<String>)> {
        match node.kind() {
            NodeKind::Sequence => node
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| (item.as_str(), vec![format!("[{index}]")]))
                .collect(),
            _ => vec![(node.as_str(), Vec::new())],
        }
    }
}

impl LintRule for DependsOnRuleImpl {
    fn id(&self) -> &'static str {
        "E3005"
    }

    fn short_description(&self) -> &'static str {
        "Check DependsOn values for Resources"
    }

    fn description(&self) -> &'static str {
        "Check that the DependsOn values are valid"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-attribute-dependson.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "dependson"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, resource) in template.resources() {
            let Some(node) = resource.attribute_node("DependsOn") else {
                continue;
            };
            let mut base = entity_path("Resources", name);
            base.push("DependsOn".to_string());

            for (target, rest) in Self::entries(node) {
                let path: Vec<String> = base.iter().chain(&rest).cloned().collect();
                let message = match target {
                    None => "DependsOn must be a string or a list of strings".to_string(),
                    Some(target) if target == name => format!("Resource {name} cannot depend on itself"),
                    Some(target) if template.has_resource(target) => continue,
                    Some(target) => {
                        let others = template.resources().map(|(other, _)| other).filter(|other| *other != name);
                        match closest(target, others) {
                            Some(suggestion) => {
                                format!("DependsOn {target} is not a resource. Did you mean {suggestion}?")
                            }
                            None => format!("DependsOn {target} is not a resource in Resources"),
                        }
                    }
                };
                findings.push(report(template, self.id(), message, path));
            }
        }
        findings
    }
}
