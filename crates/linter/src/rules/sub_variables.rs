use super::{expression_scopes, is_ref_target, report};
use crate::traits::LintRule;
use cfn_template::walk::{find_intrinsic, sub_tokens};
use cfn_template::{Template, Value};
use cfn_types::Finding;

/// Lint rule that checks `Fn::Sub` operands and the variables they use.
///
/// A `${Name}` must be a parameter, resource, pseudo-parameter or a key of
/// the variable map; `${Resource.Attribute}` must name a resource.
/// `${!Literal}` is an escape and never checked.
pub struct SubVariablesRuleImpl;

impl LintRule for SubVariablesRuleImpl {
    fn id(&self) -> &'static str {
        "E1019"
    }

    fn short_description(&self) -> &'static str {
        "Sub validation of parameters"
    }

    fn description(&self) -> &'static str {
        "Making sure the Sub function is properly configured and its variables exist"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-sub.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "sub"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_intrinsic(&scope.value, "Fn::Sub") {
                let path = scope.path(&site.path);
                let (text, bound) = match site.operand {
                    Value::String(text) => (text.as_str(), None),
                    Value::Sequence(items) if items.len() == 2 => match (&items[0], &items[1]) {
                        (Value::String(text), Value::Mapping(map)) => (text.as_str(), Some(map)),
                        _ => {
                            findings.push(report(
                                template,
                                self.id(),
                                "Fn::Sub list must contain a string and a map of variables",
                                path,
                            ));
                            continue;
                        }
                    },
                    _ => {
                        findings.push(report(
                            template,
                            self.id(),
                            "Fn::Sub must be a string or a list of a string and a map",
                            path,
                        ));
                        continue;
                    }
                };

                for token in sub_tokens(text) {
                    if bound.is_some_and(|map| map.contains_key(token)) {
                        continue;
                    }
                    let known = match token.split_once('.') {
                        Some((resource, _)) => template.has_resource(resource),
                        None => is_ref_target(template, token),
                    };
                    if !known {
                        findings.push(report(
                            template,
                            self.id(),
                            format!("Parameter {token} for Fn::Sub not found"),
                            path.clone(),
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

    #[test]
    fn test_sub_variables() {
        let template = parse(
            "\
Parameters:
  Env: {Type: String}
Resources:
  Topic:
    Type: AWS::SNS::Topic
    Properties:
      TopicName: !Sub '${Env}-${AWS::Region}-${!Literal}-${Topic.TopicName}-${Missing}'
      DisplayName: !Sub ['${Local}-${Other}', {Local: x}]
      KmsMasterKeyId: !Sub [a, b, c]
",
        );
        let findings = SubVariablesRuleImpl.evaluate(&template);
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Parameter Missing for Fn::Sub not found",
                "Parameter Other for Fn::Sub not found",
                "Fn::Sub must be a string or a list of a string and a map",
            ]
        );
        assert_eq!(findings[0].line, 7);
    }
}
