use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{NodeKind, Template};
use cfn_types::Finding;

const OUTPUT_KEYS: &[&str] = &["Condition", "Description", "Export", "Value"];

/// Lint rule that checks outputs only use known properties and that an
/// `Export` carries a `Name`.
pub struct OutputStructureRuleImpl;

impl LintRule for OutputStructureRuleImpl {
    fn id(&self) -> &'static str {
        "E6001"
    }

    fn short_description(&self) -> &'static str {
        "Check the properties of Outputs"
    }

    fn description(&self) -> &'static str {
        "Validate the property structure for outputs"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/outputs-section-structure.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["outputs"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (name, output) in template.outputs() {
            let path = entity_path("Outputs", name);
            let body = &output.declaration.node;
            if body.kind() != NodeKind::Mapping {
                findings.push(report(template, self.id(), format!("Output {name} must be an object"), path));
                continue;
            }

            for key in body.keys() {
                if !OUTPUT_KEYS.contains(&key) {
                    let mut key_path = path.clone();
                    key_path.push(key.to_string());
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Output {name} has invalid property {key}"),
                        key_path,
                    ));
                }
            }

            if let Some(export) = body.get("Export") {
                let mut export_path = path;
                export_path.push("Export".to_string());
                if export.kind() != NodeKind::Mapping {
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Export of output {name} must be an object"),
                        export_path,
                    ));
                } else if export.get("Name").is_none() {
                    findings.push(report(
                        template,
                        self.id(),
                        format!("Export of output {name} is missing required property Name"),
                        export_path,
                    ));
                }
            }
        }
        findings
    }
}
