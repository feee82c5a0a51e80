use super::{condition_uses, entity_path, report};
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;
use std::collections::HashSet;

/// Lint rule that warns about conditions nothing refers to.
pub struct UnusedConditionRuleImpl;

impl LintRule for UnusedConditionRuleImpl {
    fn id(&self) -> &'static str {
        "W8001"
    }

    fn short_description(&self) -> &'static str {
        "Check if Conditions are Used"
    }

    fn description(&self) -> &'static str {
        "Making sure the conditions defined are used"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/conditions-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["conditions"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let used: HashSet<String> = condition_uses(template).into_iter().map(|used| used.name).collect();
        template
            .conditions()
            .filter(|(name, _)| !used.contains(*name))
            .map(|(name, _)| {
                report(
                    template,
                    self.id(),
                    format!("Condition {name} not used"),
                    entity_path("Conditions", name),
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
    fn test_unused_condition() {
        let template = parse(
            "\
Conditions:
  IsProd: !Equals [!Ref 'AWS::Region', us-east-1]
  IsDev: !Not [!Condition IsProd]
  Orphan: !Equals [a, b]
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Condition: IsDev
",
        );
        let findings = UnusedConditionRuleImpl.evaluate(&template);
        assert_eq!(paths(&findings), vec!["Conditions/Orphan"]);
    }
}
