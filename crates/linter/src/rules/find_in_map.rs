use super::{expression_scopes, list_len, report};
use crate::traits::LintRule;
use cfn_template::walk::find_intrinsic;
use cfn_template::{Template, Value};
use cfn_types::Finding;

/// Lint rule that checks `Fn::FindInMap` has three arguments and names a
/// declared mapping. Keys are only checked when every argument is a literal.
pub struct FindInMapRuleImpl;

impl LintRule for FindInMapRuleImpl {
    fn id(&self) -> &'static str {
        "E1011"
    }

    fn short_description(&self) -> &'static str {
        "FindInMap validation of configuration"
    }

    fn description(&self) -> &'static str {
        "Making sure the function is a list of appropriate config and the mapping exists"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-findinmap.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "findinmap"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::FindInMap") {
                let path = scope.path(&site.path);
                if list_len(site.operand) != Some(3) {
                    findings.push(report(
                        template,
                        self.id(),
                        "Fn::FindInMap must be a list of exactly 3 elements",
                        path,
                    ));
                    continue;
                }
                let Some(args) = site.operand.as_sequence() else {
                    continue;
                };
                let Some(map_name) = args[0].as_str() else {
                    continue;
                };
                let Some(mapping) = template.get_mapping(map_name) else {
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Mapping {map_name} referenced by Fn::FindInMap does not exist"),
                        path,
                    ));
                    continue;
                };
                if let (Value::String(top), Value::String(second)) = (&args[1], &args[2]) {
                    if mapping.lookup(top, second).is_none() {
                        findings.push(report(
                            template,
                            self.id(),
                            format!("Keys {top}/{second} do not exist in mapping {map_name}"),
                            path,
                        ));
                    }
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::parse;

    const TEMPLATE: &str = "\
Mappings:
  Regions:
    us-east-1: {Ami: ami-1}
Resources:
  A:
    Type: AWS::EC2::Instance
    Properties:
      ImageId: !FindInMap [Regions, !Ref 'AWS::Region', Ami]
      Other: !FindInMap [Regions, us-east-1, Missing]
      Third: !FindInMap [Nope, a, b]
      Short: !FindInMap [Regions, a]
";

    #[test]
    fn test_find_in_map() {
        let findings = FindInMapRuleImpl.evaluate(&parse(TEMPLATE));
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Keys us-east-1/Missing do not exist in mapping Regions",
                "Mapping Nope referenced by Fn::FindInMap does not exist",
                "Fn::FindInMap must be a list of exactly 3 elements",
            ]
        );
        assert_eq!(findings[0].line, 9);
    }
}
