use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::{Template, Value};
use cfn_types::Finding;
use std::collections::HashSet;

/// Lint rule that warns about mappings no `Fn::FindInMap` looks up.
///
/// A map name computed by another intrinsic could select any mapping, so
/// its presence disables the check.
pub struct UnusedMappingRuleImpl;

impl LintRule for UnusedMappingRuleImpl {
    fn id(&self) -> &'static str {
        "W7001"
    }

    fn short_description(&self) -> &'static str {
        "Check if Mappings are Used"
    }

    fn description(&self) -> &'static str {
        "Making sure the mappings defined are used"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/mappings-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["mappings"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut used = HashSet::new();
        for section in template.top_level_keys().filter(|key| *key != "Mappings") {
            let Some(node) = template.section_node(section) else {
                continue;
            };
            let value = node.to_value();
            for site in find_intrinsic(&value, "Fn::FindInMap") {
                match site.operand.as_sequence().and_then(<[Value]>::first) {
                    Some(Value::String(name)) => {
                        used.insert(name.clone());
                    }
                    Some(_) => return Vec::new(),
                    None => {}
                }
            }
        }

        template
            .mappings()
            .filter(|(name, _)| !used.contains(*name))
            .map(|(name, _)| {
                report(
                    template,
                    self.id(),
                    format!("Mapping {name} not used"),
                    entity_path("Mappings", name),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{parse, paths};

    #[test]
    fn test_unused_mapping() {
        let template = parse(
            "\
Mappings:
  RegionMap:
    us-east-1: {Ami: ami-1}
  Stale:
    a: {b: c}
Resources:
  Instance:
    Type: AWS::EC2::Instance
    Properties:
      ImageId: !FindInMap [RegionMap, !Ref 'AWS::Region', Ami]
",
        );
        let findings = UnusedMappingRuleImpl.evaluate(&template);
        assert_eq!(paths(&findings), vec!["Mappings/Stale"]);
    }

    #[test]
    fn test_dynamic_map_name_disables_check() {
        let template = parse(
            "\
Parameters:
  Which: {Type: String}
Mappings:
  A: {x: {y: z}}
  B: {x: {y: z}}
Resources:
  Topic:
    Type: AWS::SNS::Topic
    Properties:
      TopicName: !FindInMap [!Ref Which, x, y]
",
        );
        assert!(UnusedMappingRuleImpl.evaluate(&template).is_empty());
    }
}
