use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;

const MAX_LOGICAL_ID_LENGTH: usize = 255;

/// Sections whose keys are logical IDs
const NAMED_SECTIONS: &[&str] = &["Parameters", "Mappings", "Resources", "Outputs"];

/// Lint rule that checks logical IDs are alphanumeric and not too long.
pub struct LogicalIdRuleImpl;

impl LintRule for LogicalIdRuleImpl {
    fn id(&self) -> &'static str {
        "E3006"
    }

    fn short_description(&self) -> &'static str {
        "Logical IDs are alphanumeric"
    }

    fn description(&self) -> &'static str {
        "Check that the logical IDs of parameters, mappings, resources and outputs are alphanumeric and at most 255 characters"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/resources-section-structure.html#resources-section-logical-id"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "base"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for section in NAMED_SECTIONS {
            let Some(node) = template.section_node(section) else {
                continue;
            };
            for name in node.keys() {
                let message = if !name.chars().all(|c| c.is_ascii_alphanumeric()) || name.is_empty() {
                    format!("{section} logical ID {name} must be alphanumeric")
                } else if name.len() > MAX_LOGICAL_ID_LENGTH {
                    format!("{section} logical ID {name} exceeds {MAX_LOGICAL_ID_LENGTH} characters")
                } else {
                    continue;
                };
                findings.push(report(template, self.id(), message, entity_path(section, name)));
            }
        }
        findings
    }
}
