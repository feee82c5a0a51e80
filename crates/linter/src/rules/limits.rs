//! Template-level aggregate limits.
use super::report;
use crate::traits::LintRule;
use cfn_template::Template;
use cfn_types::Finding;

pub(crate) const MAX_PARAMETERS: usize = 200;
pub(crate) const MAX_RESOURCES: usize = 500;
pub(crate) const MAX_OUTPUTS: usize = 200;
pub(crate) const MAX_MAPPINGS: usize = 200;

/// Share of [`MAX_RESOURCES`], in percent, at which I3011 starts reporting
const RESOURCE_WARNING_PERCENT: usize = 80;

const LIMITS_URL: &str = "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/cloudformation-limits.html";

fn over_limit(template: &Template, rule_id: &str, section: &str, count: usize, limit: usize) -> Vec<Finding> {
    if count <= limit {
        return Vec::new();
    }
    vec![report(
        template,
        rule_id,
        format!("The template has {count} {}, more than the limit of {limit}", section.to_lowercase()),
        vec![section.to_string()],
    )]
}

pub struct ParameterLimitRuleImpl;

impl LintRule for ParameterLimitRuleImpl {
    fn id(&self) -> &'static str {
        "E2010"
    }

    fn short_description(&self) -> &'static str {
        "Parameter limit not exceeded"
    }

    fn description(&self) -> &'static str {
        "Check the number of Parameters in the template is less than the upper limit"
    }

    fn source_url(&self) -> &'static str {
        LIMITS_URL
    }

    fn tags(&self) -> &'static [&'static str] {
        &["parameters", "limits"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        over_limit(template, self.id(), "Parameters", template.parameters.len(), MAX_PARAMETERS)
    }
}

pub struct ResourceLimitRuleImpl;

impl LintRule for ResourceLimitRuleImpl {
    fn id(&self) -> &'static str {
        "E3010"
    }

    fn short_description(&self) -> &'static str {
        "Resource limit not exceeded"
    }

    fn description(&self) -> &'static str {
        "Check the number of Resources in the template is less than the upper limit"
    }

    fn source_url(&self) -> &'static str {
        LIMITS_URL
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "limits"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        over_limit(template, self.id(), "Resources", template.resources.len(), MAX_RESOURCES)
    }
}

pub struct OutputLimitRuleImpl;

impl LintRule for OutputLimitRuleImpl {
    fn id(&self) -> &'static str {
        "E6010"
    }

    fn short_description(&self) -> &'static str {
        "Output limit not exceeded"
    }

    fn description(&self) -> &'static str {
        "Check the number of Outputs in the template is less than the upper limit"
    }

    fn source_url(&self) -> &'static str {
        LIMITS_URL
    }

    fn tags(&self) -> &'static [&'static str] {
        &["outputs", "limits"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        over_limit(template, self.id(), "Outputs", template.outputs.len(), MAX_OUTPUTS)
    }
}

pub struct MappingLimitRuleImpl;

impl LintRule for MappingLimitRuleImpl {
    fn id(&self) -> &'static str {
        "E7010"
    }

    fn short_description(&self) -> &'static str {
        "Mapping limit not exceeded"
    }

    fn description(&self) -> &'static str {
        "Check the number of Mappings in the template is less than the upper limit"
    }

    fn source_url(&self) -> &'static str {
        LIMITS_URL
    }

    fn tags(&self) -> &'static [&'static str] {
        &["mappings", "limits"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        over_limit(template, self.id(), "Mappings", template.mappings.len(), MAX_MAPPINGS)
    }
}

/// Lint rule that reports templates getting close to the resource limit,
/// while still within it.
pub struct ResourceLimitApproachingRuleImpl;

impl LintRule for ResourceLimitApproachingRuleImpl {
    fn id(&self) -> &'static str {
        "I3011"
    }

    fn short_description(&self) -> &'static str {
        "Resource limit approaching"
    }

    fn description(&self) -> &'static str {
        "Check the number of Resources in the template is not close to the upper limit"
    }

    fn source_url(&self) -> &'static str {
        LIMITS_URL
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "limits"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        let count = template.resources.len();
        let threshold = MAX_RESOURCES * RESOURCE_WARNING_PERCENT / 100;
        if count < threshold || count > MAX_RESOURCES {
            return Vec::new();
        }
        vec![report(
            template,
            self.id(),
            format!("The template has {count} resources, approaching the limit of {MAX_RESOURCES}"),
            vec!["Resources".to_string()],
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    fn template_with(section: &str, count: usize, body: &str) -> Template {
        let mut source = format!("{section}:\n");
        for i in 0..count {
            let _ = writeln!(source, "  Item{i}: {body}");
        }
        if section != "Resources" {
            source.push_str("Resources: {}\n");
        }
        Template::from_source(&source, "template.yaml").unwrap()
    }

    #[test]
    fn test_parameter_limit() {
        let at_limit = template_with("Parameters", MAX_PARAMETERS, "{Type: String}");
        assert!(ParameterLimitRuleImpl.evaluate(&at_limit).is_empty());

        let over = template_with("Parameters", MAX_PARAMETERS + 1, "{Type: String}");
        let findings = ParameterLimitRuleImpl.evaluate(&over);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "The template has 201 parameters, more than the limit of 200");
        assert_eq!(findings[0].location(), cfn_types::Location::new(1, 1));
    }

    #[test]
    fn test_resource_limits() {
        let busy = template_with("Resources", 450, "{Type: 'AWS::SNS::Topic'}");
        assert!(ResourceLimitRuleImpl.evaluate(&busy).is_empty());
        assert_eq!(ResourceLimitApproachingRuleImpl.evaluate(&busy).len(), 1);

        let quiet = template_with("Resources", 10, "{Type: 'AWS::SNS::Topic'}");
        assert!(ResourceLimitApproachingRuleImpl.evaluate(&quiet).is_empty());

        let over = template_with("Resources", MAX_RESOURCES + 1, "{Type: 'AWS::SNS::Topic'}");
        assert_eq!(ResourceLimitRuleImpl.evaluate(&over).len(), 1);
        assert!(ResourceLimitApproachingRuleImpl.evaluate(&over).is_empty());
    }

    #[test]
    fn test_output_and_mapping_limits() {
        let outputs = template_with("Outputs", MAX_OUTPUTS + 1, "{Value: x}");
        assert_eq!(OutputLimitRuleImpl.evaluate(&outputs).len(), 1);

        let mappings = template_with("Mappings", MAX_MAPPINGS + 1, "{A: {B: c}}");
        assert_eq!(MappingLimitRuleImpl.evaluate(&mappings).len(), 1);
    }
}
