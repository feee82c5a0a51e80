use super::{closest, expression_scopes, is_ref_target, report};
use crate::traits::LintRule;
use cfn_template::walk::find_refs;
use cfn_template::{Template, PSEUDO_PARAMETERS};
use cfn_types::Finding;

/// Lint rule that detects `Ref` to a name that is not a parameter, a
/// resource or a pseudo-parameter.
pub struct RefTargetRuleImpl;

impl LintRule for RefTargetRuleImpl {
    fn id(&self) -> &'static str {
        "E1012"
    }

    fn short_description(&self) -> &'static str {
        "Check if Refs exist"
    }

    fn description(&self) -> &'static str {
        "Making sure the refs exist as parameters, resources or pseudo-parameters"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-ref.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "ref"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_refs(&scope.value) {
                if is_ref_target(template, site.target) {
                    continue;
                }
                let candidates = template
                    .parameters()
                    .map(|(name, _)| name)
                    .chain(template.resources().map(|(name, _)| name))
                    .chain(PSEUDO_PARAMETERS.iter().copied());
                let message = match closest(site.target, candidates) {
                    Some(suggestion) => format!("Ref {} not found. Did you mean {suggestion}?", site.target),
                    None => format!("Ref {} not found as a parameter, resource or pseudo-parameter", site.target),
                };
                findings.push(report(template, self.id(), message, scope.path(&site.path)));
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
    fn test_undefined_ref() {
        let template = parse(
            "\
Parameters:
  BucketName: {Type: String}
Resources:
  B:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: !Ref BuckteName
      Tags:
        - {Key: region, Value: !Ref 'AWS::Region'}
        - {Key: other, Value: !Ref Elsewhere}
",
        );
        let findings = RefTargetRuleImpl.evaluate(&template);
        assert_eq!(
            paths(&findings),
            vec!["Resources/B/Properties/BucketName", "Resources/B/Properties/Tags/[1]/Value"]
        );
        assert_eq!(findings[0].message, "Ref BuckteName not found. Did you mean BucketName?");
        assert_eq!((findings[1].line, findings[1].column), (10, 24));
    }

    #[test]
    fn test_condition_refs_to_parameters() {
        let template = parse("Parameters:\n  Env: {Type: String}\nConditions:\n  Prod: !Equals [!Ref Env, prod]\nResources: {}\n");
        assert!(RefTargetRuleImpl.evaluate(&template).is_empty());
    }
}
