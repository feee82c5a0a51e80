use super::{closest, condition_uses, report};
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that detects references to conditions that are not declared
/// under `Conditions`.
pub struct ConditionRefsRuleImpl;

impl LintRule for ConditionRefsRuleImpl {
    fn id(&self) -> &'static str {
        "E8002"
    }

    fn short_description(&self) -> &'static str {
        "Check if the referenced Conditions are defined"
    }

    fn description(&self) -> &'static str {
        "Making sure the used conditions are actually defined in the Conditions section"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/conditions-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["conditions"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        condition_uses(template)
            .into_iter()
            .filter(|used| !template.has_condition(&used.name))
            .map(|used| {
                let declared = template.conditions().map(|(name, _)| name);
                let message = match closest(&used.name, declared) {
                    Some(suggestion) => format!("Condition {} is not defined. Did you mean {suggestion}?", used.name),
                    None => format!("Condition {} is not defined", used.name),
                };
                report(template, self.id(), message, used.path)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{parse, paths};
    use cfn_types::{Location, Severity};

    #[test]
    fn test_undefined_resource_condition() {
        let template = parse(
            "\
Resources:
  MyBucket:
    Type: 'AWS::S3::Bucket'
    Condition: NonExistent
",
        );
        let findings = ConditionRefsRuleImpl.evaluate(&template);
        assert_eq!(paths(&findings), vec!["Resources/MyBucket/Condition"]);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].location(), Location::new(4, 5));
    }

    #[test]
    fn test_condition_uses_everywhere() {
        let template = parse(
            "\
Conditions:
  IsProd: !Equals [!Ref 'AWS::Region', us-east-1]
  Both: !And [!Condition IsProd, !Condition IsProf]
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Condition: IsProd
    Properties:
      BucketName: !If [Missing, a, !Ref 'AWS::NoValue']
Outputs:
  Name:
    Condition: Nowhere
    Value: !If [IsProd, x, y]
",
        );
        let findings = ConditionRefsRuleImpl.evaluate(&template);
        assert_eq!(
            paths(&findings),
            vec![
                "Outputs/Name/Condition",
                "Conditions/Both/Fn::And/[1]",
                "Resources/Bucket/Properties/BucketName",
            ]
        );
        assert_eq!(findings[1].message, "Condition IsProf is not defined. Did you mean IsProd?");
    }
}
