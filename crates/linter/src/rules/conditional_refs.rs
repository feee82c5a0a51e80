use super::{expression_scopes, report};
use crate::traits::LintRule;
use cfn_template::walk::{find_references, ReferenceKind};
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that warns when a resource or output refers to a conditional
/// resource without being guarded by the same condition.
///
/// References inside an `Fn::If` branch are assumed to be guarded.
pub struct ConditionalRefsRuleImpl;

impl ConditionalRefsRuleImpl {
    /// The condition a resource or output scope is created under
    fn scope_condition<'t>(template: &'t Template, prefix: &[String]) -> Option<&'t str> {
        match prefix {
            [section, name] if section == "Resources" => {
                template.get_resource(name).and_then(|resource| resource.condition.as_deref())
            }
            [section, name] if section == "Outputs" => {
                template.get_output(name).and_then(|output| output.condition.as_deref())
            }
            _ => None,
        }
    }
}

impl LintRule for ConditionalRefsRuleImpl {
    fn id(&self) -> &'static str {
        "W1001"
    }

    fn short_description(&self) -> &'static str {
        "Ref/GetAtt to resource that is available when conditions are applied"
    }

    fn description(&self) -> &'static str {
        "Check the Conditions that affect a Ref/GetAtt to make sure the resource being related to is available when there is a resource condition"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/conditions-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["conditions", "resources", "functions"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            if scope.prefix.first().is_some_and(|section| section == "Conditions") {
                continue;
            }
            let context = Self::scope_condition(template, &scope.prefix);
            for reference in find_references(&scope.value) {
                let Some(target) = template.get_resource(reference.name) else {
                    continue;
                };
                let Some(condition) = target.condition.as_deref() else {
                    continue;
                };
                if context == Some(condition) || reference.path.iter().any(|segment| segment == "Fn::If") {
                    continue;
                }
                let function = match reference.kind {
                    ReferenceKind::Ref => "Ref",
                    ReferenceKind::GetAtt => "GetAtt",
                    ReferenceKind::Sub => "Sub",
                };
                findings.push(report(
                    template,
                    self.id(),
                    format!(
                        "{function} to resource {} that may not be available when condition {condition} is false",
                        reference.name
                    ),
                    scope.path(&reference.path),
                ));
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{parse, paths};
    use cfn_types::Severity;

    #[test]
    fn test_conditional_refs() {
        let template = parse(
            "\
Conditions:
  IsProd: !Equals [!Ref 'AWS::Region', us-east-1]
Resources:
  Queue:
    Type: AWS::SQS::Queue
    Condition: IsProd
  SameCondition:
    Type: AWS::SNS::Topic
    Condition: IsProd
    Properties:
      TopicName: !GetAtt Queue.QueueName
  Guarded:
    Type: AWS::SNS::Topic
    Properties:
      TopicName: !If [IsProd, !Ref Queue, !Ref 'AWS::NoValue']
  Unguarded:
    Type: AWS::SNS::Topic
    Properties:
      TopicName: !Sub '${Queue.QueueName}-topic'
Outputs:
  QueueUrl:
    Value: !Ref Queue
",
        );
        let findings = ConditionalRefsRuleImpl.evaluate(&template);
        assert_eq!(paths(&findings), vec!["Resources/Unguarded/Properties/TopicName", "Outputs/QueueUrl/Value"]);
        assert_eq!(
            findings[1].message,
            "Ref to resource Queue that may not be available when condition IsProd is false"
        );
        assert_eq!(findings[0].severity, Severity::Warning);
    }
}
