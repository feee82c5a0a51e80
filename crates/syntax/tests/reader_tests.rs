//! Integration tests for cfn-syntax.
//!
//! These tests cover short-tag rewriting, position tracking, duplicate key
//! detection and the reader's failure modes.

use cfn_syntax::{parse, parse_bytes, NodeKind, ParseErrorKind, Value, INTRINSIC_TAGS};
use cfn_types::Location;

fn value_of(source: &str, key: &str) -> Value {
    let doc = parse(source).unwrap();
    doc.root().get(key).unwrap().to_value()
}

#[test]
fn test_document_wraps_root_mapping() {
    let doc = parse("AWSTemplateFormatVersion: '2010-09-09'\n").unwrap();
    assert_eq!(doc.kind(), NodeKind::Document);
    assert_eq!(doc.root().kind(), NodeKind::Mapping);
    assert_eq!(doc.children().len(), 1);
}

#[test]
fn test_key_positions() {
    let source = "\
AWSTemplateFormatVersion: '2010-09-09'
Resources:
  MyBucket:
    Type: 'AWS::S3::Bucket'
";
    let doc = parse(source).unwrap();
    let (key, resources) = doc.root().get_entry("Resources").unwrap();
    assert_eq!(key.location(), Location::new(2, 1));

    let (bucket_key, bucket) = resources.get_entry("MyBucket").unwrap();
    assert_eq!(bucket_key.location(), Location::new(3, 3));
    assert_eq!(bucket.get("Type").and_then(|n| n.as_str()), Some("AWS::S3::Bucket"));
}

#[test]
fn test_mapping_order_is_preserved() {
    let doc = parse("Zeta: 1\nAlpha: 2\nMiddle: 3\n").unwrap();
    let keys: Vec<_> = doc.root().keys().collect();
    assert_eq!(keys, vec!["Zeta", "Alpha", "Middle"]);

    let children = doc.root().children();
    assert_eq!(children.len(), 6);
    assert_eq!(children[0].raw_value(), Some("Zeta"));
    assert_eq!(children[1].raw_value(), Some("1"));
}

#[test]
fn test_every_short_tag_matches_long_form() {
    for tag in INTRINSIC_TAGS {
        let operand = match tag.tag {
            "Ref" | "Condition" | "Sub" | "Base64" | "GetAZs" | "ImportValue" => "Thing",
            "GetAtt" => "[Thing, Arn]",
            _ => "[a, b]",
        };
        let short = format!("Key: !{} {operand}\n", tag.tag);
        let long = format!("Key: {{\"{}\": {operand}}}\n", tag.key);

        assert_eq!(
            value_of(&short, "Key"),
            value_of(&long, "Key"),
            "short form of !{} differs from long form",
            tag.tag
        );
    }
}

#[test]
fn test_ref_and_condition_keep_bare_keys() {
    let value = value_of("Key: !Ref Bucket\n", "Key");
    assert_eq!(value.as_intrinsic().map(|(name, _)| name), Some("Ref"));

    let value = value_of("Key: !Condition IsProd\n", "Key");
    assert_eq!(value.as_intrinsic().map(|(name, _)| name), Some("Condition"));
}

#[test]
fn test_getatt_scalar_splits_on_first_dot() {
    let value = value_of("Key: !GetAtt Stack.Outputs.BucketName\n", "Key");
    let expected = value_of("Key: {\"Fn::GetAtt\": [Stack, Outputs.BucketName]}\n", "Key");
    assert_eq!(value, expected);
}

#[test]
fn test_sub_pair_form_is_preserved() {
    let value = value_of("Key: !Sub ['${A}-${B}', {A: x, B: !Ref Y}]\n", "Key");
    let (name, operand) = value.as_intrinsic().unwrap();
    assert_eq!(name, "Fn::Sub");
    let parts = operand.as_sequence().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].as_str(), Some("${A}-${B}"));
    assert!(parts[1].get("B").and_then(Value::as_intrinsic).is_some());
}

#[test]
fn test_nested_short_tags() {
    let value = value_of("Key: !If [IsProd, !Ref A, !Ref 'AWS::NoValue']\n", "Key");
    let (name, operand) = value.as_intrinsic().unwrap();
    assert_eq!(name, "Fn::If");
    let items = operand.as_sequence().unwrap();
    assert_eq!(items[0].as_str(), Some("IsProd"));
    assert_eq!(items[2].get("Ref").and_then(Value::as_str), Some("AWS::NoValue"));
}

#[test]
fn test_rewritten_node_takes_tag_position() {
    let doc = parse("Value: !Ref Bucket\n").unwrap();
    let node = doc.root().get("Value").unwrap();
    assert_eq!(node.kind(), NodeKind::Mapping);
    assert_eq!(node.location(), Location::new(1, 8));

    let source = "\
Value: !Join
  - ''
  - [a, b]
";
    let doc = parse(source).unwrap();
    let node = doc.root().get("Value").unwrap();
    assert_eq!(node.location(), Location::new(1, 8));
}

#[test]
fn test_empty_tagged_scalar_is_empty_string() {
    let value = value_of("Key: !GetAZs\n", "Key");
    assert_eq!(value.get("Fn::GetAZs"), Some(&Value::String(String::new())));
}

#[test]
fn test_scalar_resolution() {
    let doc = parse("A: 42\nB: '42'\nC: true\nD: ~\nE: 1.5\nF: 2010-09-09\n").unwrap();
    let root = doc.root();
    assert_eq!(root.get("A").unwrap().to_value(), Value::Integer(42));
    assert_eq!(root.get("B").unwrap().to_value(), Value::String("42".into()));
    assert_eq!(root.get("C").unwrap().to_value(), Value::Bool(true));
    assert_eq!(root.get("D").unwrap().to_value(), Value::Null);
    assert_eq!(root.get("E").unwrap().to_value(), Value::Float(1.5));
    assert_eq!(root.get("F").unwrap().to_value(), Value::String("2010-09-09".into()));
}

#[test]
fn test_numeric_keys_are_strings() {
    let doc = parse("Mappings:\n  Years:\n    2012: {Name: old}\n").unwrap();
    let years = doc.root().find_path(&["Mappings", "Years"]).unwrap();
    assert_eq!(years.keys().collect::<Vec<_>>(), vec!["2012"]);
}

#[test]
fn test_find_path_through_sequences() {
    let doc = parse("List:\n  - {Name: a}\n  - {Name: b}\n").unwrap();
    let node = doc.root().find_path(&["List", "[1]", "Name"]).unwrap();
    assert_eq!(node.as_str(), Some("b"));
    assert!(doc.root().find_path(&["List", "[5]"]).is_none());
}

#[test]
fn test_anchors_are_resolved() {
    let doc = parse("Base: &props {Size: 1}\nCopy: *props\n").unwrap();
    let root = doc.root();
    assert_eq!(root.get("Base").unwrap().to_value(), root.get("Copy").unwrap().to_value());
}

#[test]
fn test_json_input() {
    let source = "{\n\t\"Resources\": {\n\t\t\"B\": {\"Type\": \"AWS::S3::Bucket\"}\n\t}\n}\n";
    let doc = parse(source).unwrap();
    let (key, _) = doc.root().get_entry("Resources").unwrap();
    assert_eq!(key.line(), 2);
    let ty = doc.root().find_path(&["Resources", "B", "Type"]).unwrap();
    assert_eq!(ty.as_str(), Some("AWS::S3::Bucket"));
}

#[test]
fn test_json_positions() {
    let doc = parse("{\"Resources\": {}}").unwrap();
    let (key, _) = doc.root().get_entry("Resources").unwrap();
    assert_eq!(key.location(), Location::new(1, 2));
}

#[test]
fn test_duplicate_key_is_an_error() {
    let source = "\
Resources:
  A: {Type: 'AWS::S3::Bucket'}
  A: {Type: 'AWS::SNS::Topic'}
";
    let err = parse(source).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::DuplicateKey);
    assert_eq!(err.location, Location::new(3, 3));
    assert!(err.message.contains("first defined at line 2"));
}

#[test]
fn test_duplicate_keys_in_different_mappings_are_fine() {
    assert!(parse("A: {Name: x}\nB: {Name: y}\n").is_ok());
}

#[test]
fn test_unknown_tag_is_an_error() {
    let err = parse("Key: !Bogus value\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnknownIntrinsicTag);
    assert_eq!(err.location.line, 1);
    assert!(err.message.contains("!Bogus"));
}

#[test]
fn test_core_tags_are_accepted() {
    let doc = parse("A: !!str 42\n").unwrap();
    assert_eq!(doc.root().get("A").unwrap().to_value(), Value::String("42".into()));
}

#[test]
fn test_malformed_yaml() {
    let err = parse("Key: [unclosed\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MalformedYaml);
    assert!(err.location.is_known());
}

#[test]
fn test_root_must_be_mapping() {
    let err = parse("- a\n- b\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::RootNotMapping);
    assert_eq!(err.location, Location::new(1, 1));

    let err = parse("just a string\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::RootNotMapping);
}

#[test]
fn test_empty_input() {
    assert_eq!(parse("").unwrap_err().kind, ParseErrorKind::EmptyDocument);
    assert_eq!(parse("# nothing\n").unwrap_err().kind, ParseErrorKind::EmptyDocument);
}

#[test]
fn test_multiple_documents() {
    let err = parse("A: 1\n---\nB: 2\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MultipleDocuments);
}

#[test]
fn test_invalid_utf8() {
    let err = parse_bytes(b"A: 1\nB: \xff\n").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidUtf8);
    assert_eq!(err.location, Location::new(2, 4));
}

#[test]
fn test_parse_bytes_accepts_utf8() {
    assert!(parse_bytes("Description: café\n".as_bytes()).is_ok());
}
