use super::{closest, expression_scopes, report};
use crate::traits::LintRule;
use cfn_template::walk::find_getatt;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that detects `Fn::GetAtt` calls naming a resource the template
/// does not declare, or naming no attribute.
///
/// Example:
/// ```yaml
/// Outputs:
///   Arn:
///     Value: !GetAtt MyBukcet.Arn   # no resource MyBukcet
/// ```
pub struct GetAttTargetRuleImpl;

impl LintRule for GetAttTargetRuleImpl {
    fn id(&self) -> &'static str {
        "E1010"
    }

    fn short_description(&self) -> &'static str {
        "GetAtt validation of parameters"
    }

    fn description(&self) -> &'static str {
        "Validates that GetAtt references an existing resource and names an attribute"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/intrinsic-function-reference-getatt.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["functions", "getatt"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for scope in expression_scopes(template) {
            for site in find_getatt(&scope.value) {
                let path = scope.path(&site.path);
                if !template.has_resource(site.resource) {
                    let hint = closest(site.resource, template.resources().map(|(name, _)| name))
                        .map(|name| format!(". Did you mean {name}?"))
                        .unwrap_or_default();
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Invalid GetAtt {}: resource {} does not exist{hint}", site.resource, site.resource),
                        path,
                    ));
                } else if site.attribute.is_none() {
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Invalid GetAtt {}: an attribute name is required", site.resource),
                        path,
                    ));
                }
            }
        }
        findings
    }
}
