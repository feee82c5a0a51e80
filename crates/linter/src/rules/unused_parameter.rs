use super::{entity_path, referenced_names, report};
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;

/// Lint rule that warns about parameters nothing refers to.
pub struct UnusedParameterRuleImpl;

impl LintRule for UnusedParameterRuleImpl {
    fn id(&self) -> &'static str {
        "W2001"
    }

    fn short_description(&self) -> &'static str {
        "Check if Parameters are Used"
    }

    fn description(&self) -> &'static str {
        "Making sure the parameters defined are used"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/parameters-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let used = referenced_names(template);
        template
            .parameters()
            .filter(|(name, _)| !used.contains(*name))
            .map(|(name, _)| {
                report(
                    template,
                    self.id(),
                    format!("Parameter {name} not used."),
                    entity_path("Parameters", name),
                )
            })
            .collect()
    }
}
