use super::report;
use crate::traits::LintRule;
use cfn_template::{NodeKind, Template, TOP_LEVEL_SECTIONS};
use cfn_types::Finding;

/// Sections whose body must be a mapping
const MAPPING_SECTIONS: &[&str] = &["Metadata", "Parameters", "Mappings", "Conditions", "Resources", "Outputs"];

/// Lint rule that checks the overall shape of a template
///
/// This rule checks for:
/// - Top-level keys CloudFormation does not know
/// - A missing `Resources` section
/// - Sections that must be mappings but are not
/// - An `AWSTemplateFormatVersion` other than `2010-09-09`
/// - A non-string `Description`
pub struct TemplateStructureRuleImpl;

impl LintRule for TemplateStructureRuleImpl {
    fn id(&self) -> &'static str {
        "E1001"
    }

    fn short_description(&self) -> &'static str {
        "Basic CloudFormation template structure"
    }

    fn description(&self) -> &'static str {
        "Checks that top-level sections are known, that Resources is present and that sections have the right shape"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/template-anatomy.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["base"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();

        for key in template.top_level_keys() {
            if !TOP_LEVEL_SECTIONS.contains(&key) {
                findings.push(report(
                    template,
                    self.id(),
                    format!("Top level template section {key} is not valid"),
                    vec![key.to_string()],
                ));
            }
        }

        if template.section_node("Resources").is_none() {
            findings.push(report(
                template,
                self.id(),
                "Missing top level template section Resources",
                Vec::new(),
            ));
        }

        for section in MAPPING_SECTIONS {
            if let Some(node) = template.section_node(section) {
                if node.kind() != NodeKind::Mapping {
                    findings.push(report(
                        template,
                        self.id(),
                        format!("{section} must be an object"),
                        vec![(*section).to_string()],
                    ));
                }
            }
        }

        if let Some(node) = template.section_node("AWSTemplateFormatVersion") {
            if node.raw_value() != Some("2010-09-09") {
                findings.push(report(
                    template,
                    self.id(),
                    "AWSTemplateFormatVersion must be '2010-09-09'",
                    vec!["AWSTemplateFormatVersion".to_string()],
                ));
            }
        }

        if let Some(node) = template.section_node("Description") {
            if node.as_str().is_none() {
                findings.push(report(
                    template,
                    self.id(),
                    "Description must be a string",
                    vec!["Description".to_string()],
                ));
            }
        }

        findings
    }
}
