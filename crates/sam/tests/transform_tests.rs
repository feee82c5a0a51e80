use cfn_sam::{is_sam_template, transform, TransformContext, TransformError};
use cfn_template::Template;
use cfn_types::Location;

const FUNCTION: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Transform: AWS::Serverless-2016-10-31
Resources:
  MyFunction:
    Type: AWS::Serverless::Function
    Properties: {Runtime: python3.9, Handler: i.h, CodeUri: ./s}
";

fn expand(source: &str) -> cfn_sam::Transformed {
    let template = Template::from_source(source, "template.yaml").unwrap();
    assert!(is_sam_template(&template));
    transform(&template, &TransformContext::default()).unwrap()
}

#[test]
fn test_synthesized_role_maps_to_function_declaration() {
    let transformed = expand(FUNCTION);
    assert!(transformed.template.has_resource("MyFunction"));
    assert!(transformed.template.has_resource("MyFunctionRole"));
    assert_eq!(
        transformed.template.get_resource("MyFunction").unwrap().resource_type,
        "AWS::Lambda::Function"
    );

    let origin = transformed.source_map.lookup("Resources", "MyFunctionRole").unwrap();
    assert_eq!(origin.name, "MyFunction");
    assert_eq!(origin.location, Location::new(4, 3));
    assert!(origin.synthesized);
}

#[test]
fn test_expanded_template_has_no_serverless_leftovers() {
    let transformed = expand(FUNCTION);
    assert!(!is_sam_template(&transformed.template));
    assert!(transformed.template.transform.is_none());
}

#[test]
fn test_plain_resources_keep_their_position() {
    let transformed = expand(
        "\
Transform: AWS::Serverless-2016-10-31
Resources:
  Bucket:
    Type: AWS::S3::Bucket
  Table:
    Type: AWS::Serverless::SimpleTable
",
    );
    let bucket = transformed.source_map.lookup("Resources", "Bucket").unwrap();
    assert_eq!(bucket.location, Location::new(3, 3));
    assert!(!bucket.synthesized);
    assert_eq!(
        transformed.template.get_resource("Table").unwrap().resource_type,
        "AWS::DynamoDB::Table"
    );
}

#[test]
fn test_api_event_creates_implicit_api() {
    let transformed = expand(
        "\
Transform: AWS::Serverless-2016-10-31
Resources:
  Handler:
    Type: AWS::Serverless::Function
    Properties:
      Runtime: nodejs20.x
      Handler: index.handler
      InlineCode: exports.handler = async () => ({})
      Events:
        Get:
          Type: Api
          Properties: {Path: /items, Method: get}
",
    );
    assert!(transformed.template.has_resource("ServerlessRestApi"));
    assert!(transformed.template.has_resource("HandlerGetPermission"));

    for id in ["ServerlessRestApi", "ServerlessRestApiDeployment"] {
        let origin = transformed.source_map.lookup("Resources", id).unwrap();
        assert_eq!(origin.name, "Handler", "{id}");
        assert_eq!(origin.location, Location::new(3, 3), "{id}");
        assert!(origin.synthesized);
    }
}

#[test]
fn test_context_is_substituted() {
    let template = Template::from_source(
        "\
Transform: AWS::Serverless-2016-10-31
Resources:
  Fn:
    Type: AWS::Serverless::Function
    Properties:
      Runtime: python3.12
      Handler: app.handler
      CodeUri: s3://bucket/key.zip
      Environment:
        Variables:
          REGION: !Ref AWS::Region
",
        "template.yaml",
    )
    .unwrap();
    let context = TransformContext {
        region: "eu-west-1".to_string(),
        ..TransformContext::default()
    };
    let transformed = transform(&template, &context).unwrap();
    let function = transformed.template.get_resource("Fn").unwrap();
    let region = function
        .properties
        .get("Environment")
        .and_then(|env| env.get("Variables"))
        .and_then(|vars| vars.get("REGION"))
        .and_then(cfn_template::Value::as_str);
    assert_eq!(region, Some("eu-west-1"));
}

#[test]
fn test_invalid_resource_is_a_positioned_error() {
    let template = Template::from_source(
        "\
Transform: AWS::Serverless-2016-10-31
Resources:
  Broken:
    Type: AWS::Serverless::Function
    Properties:
      Runtime: python3.12
      Handler: app.handler
",
        "template.yaml",
    )
    .unwrap();
    let err = transform(&template, &TransformContext::default()).unwrap_err();
    let TransformError::Expansion { message, location } = err else {
        panic!("expected an expansion error");
    };
    assert!(message.contains("[Broken]"));
    assert_eq!(location, Some(Location::new(3, 3)));
}
