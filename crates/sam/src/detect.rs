//! Recognising SAM templates.

use cfn_template::{Template, Value};

/// The transform name that marks a SAM template.
pub const SERVERLESS_TRANSFORM: &str = "AWS::Serverless-2016-10-31";

/// Resource types the serverless transform expands.
pub const SERVERLESS_RESOURCE_TYPES: &[&str] = &[
    "AWS::Serverless::Function",
    "AWS::Serverless::Api",
    "AWS::Serverless::HttpApi",
    "AWS::Serverless::SimpleTable",
    "AWS::Serverless::LayerVersion",
    "AWS::Serverless::Application",
    "AWS::Serverless::StateMachine",
    "AWS::Serverless::Connector",
    "AWS::Serverless::GraphQLApi",
];

/// Returns `true` if the template declares the serverless transform or
/// contains any `AWS::Serverless::*` resource.
#[must_use]
pub fn is_sam_template(template: &Template) -> bool {
    let declared = match &template.transform {
        Some(Value::String(name)) => name == SERVERLESS_TRANSFORM,
        Some(Value::Sequence(items)) => items.iter().any(|item| item.as_str() == Some(SERVERLESS_TRANSFORM)),
        _ => false,
    };
    declared
        || template
            .resources()
            .any(|(_, resource)| resource.resource_type.starts_with("AWS::Serverless::"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(source: &str) -> Template {
        Template::from_source(source, "").unwrap()
    }

    #[test]
    fn test_scalar_transform() {
        assert!(is_sam_template(&template("Transform: AWS::Serverless-2016-10-31\nResources: {}\n")));
    }

    #[test]
    fn test_transform_list() {
        let source = "Transform: [AWS::LanguageExtensions, AWS::Serverless-2016-10-31]\nResources: {}\n";
        assert!(is_sam_template(&template(source)));
    }

    #[test]
    fn test_serverless_resource_without_transform() {
        let source = "Resources:\n  Table: {Type: AWS::Serverless::SimpleTable}\n";
        assert!(is_sam_template(&template(source)));
    }

    #[test]
    fn test_plain_cloudformation() {
        let source = "Transform: AWS::Include\nResources:\n  B: {Type: AWS::S3::Bucket}\n";
        assert!(!is_sam_template(&template(source)));
    }

    #[test]
    fn test_resource_type_table() {
        assert_eq!(SERVERLESS_RESOURCE_TYPES.len(), 9);
        assert!(SERVERLESS_RESOURCE_TYPES.iter().all(|t| t.starts_with("AWS::Serverless::")));
    }
}
