//! Integration tests for the template façade.

use cfn_template::{scalar_text, Template, Value};
use cfn_types::{Location, Span};

const FULL: &str = "\
AWSTemplateFormatVersion: '2010-09-09'
Description: Sample stack
Transform: [AWS::LanguageExtensions]
Metadata:
  Owner: team
Parameters:
  Env:
    Type: String
    Default: dev
    AllowedValues: [dev, prod]
    AllowedPattern: '[a-z]+'
    MinLength: 3
    MaxLength: 4
    ConstraintDescription: lowercase
  Size:
    Type: Number
    MinValue: 1
    MaxValue: 10.5
  Secret:
    Type: String
    NoEcho: 'true'
Mappings:
  RegionMap:
    us-east-1: {Ami: ami-1}
    eu-west-1: {Ami: ami-2}
Conditions:
  IsProd: !Equals [!Ref Env, prod]
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Condition: IsProd
    DependsOn: Topic
    DeletionPolicy: Retain
    UpdateReplacePolicy: Snapshot
    Metadata: {Note: x}
    Properties:
      BucketName: !Sub '${Env}-bucket'
  Topic:
    Type: AWS::SNS::Topic
    DependsOn: [Queue, Other]
Outputs:
  BucketArn:
    Description: The bucket
    Value: !GetAtt Bucket.Arn
    Export: {Name: bucket-arn}
    Condition: IsProd
Rules:
  Check: {}
";

fn template() -> Template {
    Template::from_source(FULL, "full.yaml").unwrap()
}

#[test]
fn test_top_level_fields() {
    let t = template();
    assert_eq!(t.source_filename, "full.yaml");
    assert_eq!(t.format_version.as_deref(), Some("2010-09-09"));
    assert_eq!(t.description.as_deref(), Some("Sample stack"));
    assert_eq!(t.transforms(), vec!["AWS::LanguageExtensions"]);
    assert_eq!(t.metadata.get("Owner"), Some(&Value::String("team".into())));
}

#[test]
fn test_parameters_are_decoded() {
    let t = template();
    let env = t.get_parameter("Env").unwrap();
    assert_eq!(env.parameter_type, "String");
    assert_eq!(env.default, Some(Value::String("dev".into())));
    assert_eq!(env.allowed_values.as_ref().map(Vec::len), Some(2));
    assert_eq!(env.allowed_pattern.as_deref(), Some("[a-z]+"));
    assert_eq!((env.min_length, env.max_length), (Some(3), Some(4)));
    assert_eq!(env.constraint_description.as_deref(), Some("lowercase"));
    assert!(!env.no_echo);

    let size = t.get_parameter("Size").unwrap();
    assert_eq!((size.min_value, size.max_value), (Some(1.0), Some(10.5)));

    assert!(t.get_parameter("Secret").unwrap().no_echo);
}

#[test]
fn test_sections_keep_source_order() {
    let t = template();
    let names: Vec<_> = t.parameters().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Env", "Size", "Secret"]);
    let names: Vec<_> = t.resources().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Bucket", "Topic"]);
    let keys: Vec<_> = t.top_level_keys().collect();
    assert_eq!(keys.last(), Some(&"Rules"));
}

#[test]
fn test_resources_are_decoded() {
    let t = template();
    let bucket = t.get_resource("Bucket").unwrap();
    assert_eq!(bucket.resource_type, "AWS::S3::Bucket");
    assert_eq!(bucket.condition.as_deref(), Some("IsProd"));
    assert_eq!(bucket.depends_on, vec!["Topic"]);
    assert!(bucket.properties.contains_key("BucketName"));
    assert!(bucket.metadata.contains_key("Note"));
    assert_eq!(bucket.deletion_policy().and_then(|n| n.as_str()), Some("Retain"));
    assert_eq!(bucket.update_replace_policy().and_then(|n| n.as_str()), Some("Snapshot"));

    let topic = t.get_resource("Topic").unwrap();
    assert_eq!(topic.depends_on, vec!["Queue", "Other"]);
    assert!(topic.deletion_policy().is_none());
    assert!(topic.properties.is_empty());
}

#[test]
fn test_mappings_conditions_outputs() {
    let t = template();
    let map = t.get_mapping("RegionMap").unwrap();
    assert_eq!(map.lookup("eu-west-1", "Ami"), Some(&Value::String("ami-2".into())));

    let condition = t.get_condition("IsProd").unwrap();
    assert_eq!(condition.expression.as_intrinsic().map(|(name, _)| name), Some("Fn::Equals"));

    let output = t.get_output("BucketArn").unwrap();
    assert_eq!(output.description.as_deref(), Some("The bucket"));
    assert_eq!(output.condition.as_deref(), Some("IsProd"));
    assert_eq!(output.export.get("Name"), Some(&Value::String("bucket-arn".into())));
    assert!(output.value.is_some());
}

#[test]
fn test_has_accessors() {
    let t = template();
    assert!(t.has_parameter("Env"));
    assert!(t.has_mapping("RegionMap"));
    assert!(t.has_condition("IsProd"));
    assert!(t.has_resource("Topic"));
    assert!(t.has_output("BucketArn"));
    assert!(!t.has_resource("Missing"));
    assert!(t.section_node("Rules").is_some());
}

#[test]
fn test_entity_positions_are_key_positions() {
    let t = template();
    assert_eq!(t.get_parameter("Env").unwrap().location(), Location::new(8, 3));
    assert_eq!(t.get_resource("Bucket").unwrap().location(), Location::new(30, 3));
    assert_eq!(t.get_output("BucketArn").unwrap().location(), Location::new(43, 3));
}

#[test]
fn test_location_of_paths() {
    let t = template();
    assert_eq!(t.location_of(&["Resources", "Bucket"]), Location::new(30, 3));
    assert_eq!(t.location_of(&["Resources", "Bucket", "Condition"]), Location::new(32, 5));
    assert_eq!(t.location_of(&["Resources", "Topic", "DependsOn", "[1]"]).line, 41);
    // Paths that leave the tree stop at the deepest known position.
    assert_eq!(t.location_of(&["Resources", "Bucket", "Nope", "Deeper"]), Location::new(30, 3));
    assert!(t.span_of(&["Resources", "Bucket", "Nope"]).is_none());

    let span = t.span_of(&["Resources", "Bucket"]).unwrap();
    assert_eq!(span.start, Location::new(30, 3));
    assert!(span.contains(Location::new(38, 7)));
    assert!(!span.contains(Location::new(39, 3)));
    assert_ne!(span, Span::default());
}

#[test]
fn test_short_and_long_forms_build_the_same_template() {
    let short = "\
Conditions:
  IsProd: !Equals [!Ref Env, prod]
Resources:
  Bucket:
    Type: AWS::S3::Bucket
    Properties:
      Name: !Join ['-', [!Ref 'AWS::StackName', !GetAtt Other.Arn]]
";
    let long = r#"{
  "Conditions": {"IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]}},
  "Resources": {
    "Bucket": {
      "Type": "AWS::S3::Bucket",
      "Properties": {
        "Name": {"Fn::Join": ["-", [{"Ref": "AWS::StackName"}, {"Fn::GetAtt": ["Other", "Arn"]}]]}
      }
    }
  }
}"#;
    let short = Template::from_source(short, "").unwrap();
    let long = Template::from_source(long, "").unwrap();
    assert_eq!(short.to_json(), long.to_json());
    assert_eq!(
        short.get_condition("IsProd").unwrap().expression,
        long.get_condition("IsProd").unwrap().expression
    );
    assert_eq!(
        short.get_resource("Bucket").unwrap().properties,
        long.get_resource("Bucket").unwrap().properties
    );
}

#[test]
fn test_to_json_preserves_order() {
    let t = Template::from_source("Resources:\n  Zed: {Type: A}\n  Alpha: {Type: B}\n", "").unwrap();
    insta::assert_snapshot!(
        serde_json::to_string(&t.to_json()).unwrap(),
        @r#"{"Resources":{"Zed":{"Type":"A"},"Alpha":{"Type":"B"}}}"#
    );
}

#[test]
fn test_non_mapping_sections_decode_empty() {
    let t = Template::from_source("Resources: []\nParameters: oops\n", "").unwrap();
    assert!(t.resources.is_empty());
    assert!(t.parameters.is_empty());
    assert!(t.section_node("Resources").is_some());
}

#[test]
fn test_scalar_transform() {
    let t = Template::from_source("Transform: AWS::Serverless-2016-10-31\nResources: {}\n", "").unwrap();
    assert_eq!(t.transforms(), vec!["AWS::Serverless-2016-10-31"]);
}

#[test]
fn test_scalar_text() {
    assert_eq!(scalar_text(&Value::String("a".to_string())), Some("a".to_string()));
    assert_eq!(scalar_text(&Value::Integer(2012)), Some("2012".to_string()));
    assert_eq!(scalar_text(&Value::Bool(true)), Some("true".to_string()));
    assert_eq!(scalar_text(&Value::Null), None);
    assert_eq!(scalar_text(&Value::Sequence(Vec::new())), None);
}
