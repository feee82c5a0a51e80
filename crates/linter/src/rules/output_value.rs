use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{NodeKind, Template};
use cfn_types::Finding;

/// Lint rule that checks every output declares a `Value`.
pub struct OutputValueRuleImpl;

impl LintRule for OutputValueRuleImpl {
    fn id(&self) -> &'static str {
        "E6002"
    }

    fn short_description(&self) -> &'static str {
        "Outputs have required properties"
    }

    fn description(&self) -> &'static str {
        "Making sure the outputs have required properties"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/outputs-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["outputs"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        template
            .outputs()
            .filter(|(_, output)| output.declaration.node.kind() == NodeKind::Mapping && output.value.is_none())
            .map(|(name, _)| {
                report(
                    template,
                    self.id(),
                    format!("Output {name} is missing required property Value"),
                    entity_path("Outputs", name),
                )
            })
            .collect()
    }
}
