use super::report;
use crate::traits::LintRule;
use cfn_template::walk::find_references;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that warns when an output exposes a `NoEcho` parameter.
pub struct NoEchoOutputRuleImpl;

impl LintRule for NoEchoOutputRuleImpl {
    fn id(&self) -> &'static str {
        "W2010"
    }

    fn short_description(&self) -> &'static str {
        "NoEcho parameters are not used in Outputs"
    }

    fn description(&self) -> &'static str {
        "Check that parameters marked NoEcho are not exposed through stack outputs"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/parameters-section-structure.html#parameters-section-structure-properties"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters", "outputs", "security"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, output) in template.outputs() {
            let Some(value) = &output.value else {
                continue;
            };
            for reference in find_references(value) {
                let secret = template
                    .get_parameter(reference.name)
                    .is_some_and(|parameter| parameter.no_echo);
                if !secret {
                    continue;
                }
                let path = ["Outputs", name, "Value"]
                    .into_iter()
                    .map(str::to_string)
                    .chain(reference.path)
                    .collect();
                findings.push(report(
                    template,
                    self.id(),
                    format!("Output {name} references NoEcho parameter {}", reference.name),
                    path,
                ));
            }
        }
        findings
    }
}
