//! CloudFormation short-form intrinsic tags and their long-form rewrite.

use crate::node::{Node, NodeData, Scalar};
use crate::value::Value;
use cfn_types::Span;

/// A recognised `!Tag` and the long-form key it rewrites to.
#[derive(Debug)]
pub struct IntrinsicTag {
    pub tag: &'static str,
    pub key: &'static str,
}

/// Every short tag the reader accepts. Any other `!Name` is a parse error.
pub static INTRINSIC_TAGS: &[IntrinsicTag] = &[
    IntrinsicTag { tag: "Ref", key: "Ref" },
    IntrinsicTag { tag: "GetAtt", key: "Fn::GetAtt" },
    IntrinsicTag { tag: "Sub", key: "Fn::Sub" },
    IntrinsicTag { tag: "Join", key: "Fn::Join" },
    IntrinsicTag { tag: "Select", key: "Fn::Select" },
    IntrinsicTag { tag: "Split", key: "Fn::Split" },
    IntrinsicTag { tag: "If", key: "Fn::If" },
    IntrinsicTag { tag: "Equals", key: "Fn::Equals" },
    IntrinsicTag { tag: "And", key: "Fn::And" },
    IntrinsicTag { tag: "Or", key: "Fn::Or" },
    IntrinsicTag { tag: "Not", key: "Fn::Not" },
    IntrinsicTag { tag: "Condition", key: "Condition" },
    IntrinsicTag { tag: "FindInMap", key: "Fn::FindInMap" },
    IntrinsicTag { tag: "Base64", key: "Fn::Base64" },
    IntrinsicTag { tag: "Cidr", key: "Fn::Cidr" },
    IntrinsicTag { tag: "GetAZs", key: "Fn::GetAZs" },
    IntrinsicTag { tag: "ImportValue", key: "Fn::ImportValue" },
    IntrinsicTag { tag: "ToJsonString", key: "Fn::ToJsonString" },
];

/// Look up a short tag by name (without the leading `!`)
#[must_use]
pub fn lookup_tag(tag: &str) -> Option<&'static IntrinsicTag> {
    INTRINSIC_TAGS.iter().find(|t| t.tag == tag)
}

/// Look up a short tag by its long-form key
#[must_use]
pub fn lookup_key(key: &str) -> Option<&'static IntrinsicTag> {
    INTRINSIC_TAGS.iter().find(|t| t.key == key)
}

/// Rewrite a tagged node into its single-key long-form mapping.
///
/// The mapping and its key take the position of the tagged node. A scalar
/// `!GetAtt A.B.C` becomes `["A", "B.C"]`; an empty scalar operand becomes
/// the empty string.
pub(crate) fn rewrite(tag: &IntrinsicTag, span: Span, operand: Node) -> Node {
    let operand = match operand.data {
        NodeData::Scalar(scalar) => {
            let scalar = if scalar.plain && scalar.raw.is_empty() {
                Scalar {
                    value: Value::String(String::new()),
                    ..scalar
                }
            } else {
                scalar
            };
            if tag.tag == "GetAtt" {
                split_getatt(operand.span, scalar)
            } else {
                Node::new(operand.span, NodeData::Scalar(scalar))
            }
        }
        data => Node::new(operand.span, data),
    };

    let key = Node::string(span, tag.key);
    Node::new(span, NodeData::Mapping(vec![(key, operand)]))
}

fn split_getatt(span: Span, scalar: Scalar) -> Node {
    let Some((resource, attribute)) = scalar.raw.split_once('.') else {
        return Node::new(span, NodeData::Scalar(scalar));
    };
    let items = vec![
        Node::string(span, resource),
        Node::string(span, attribute),
    ];
    Node::new(span, NodeData::Sequence(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_types::Location;

    fn scalar(text: &str) -> Node {
        Node::string(Span::at(Location::new(3, 9)), text)
    }

    #[test]
    fn test_table_is_exact() {
        let tags: Vec<&str> = INTRINSIC_TAGS.iter().map(|t| t.tag).collect();
        assert_eq!(tags.len(), 18);
        assert!(lookup_tag("Transform").is_none());
        assert!(lookup_tag("GetParam").is_none());
        assert_eq!(lookup_tag("Ref").map(|t| t.key), Some("Ref"));
        assert_eq!(lookup_tag("Condition").map(|t| t.key), Some("Condition"));
        assert_eq!(lookup_tag("ToJsonString").map(|t| t.key), Some("Fn::ToJsonString"));
        assert_eq!(lookup_key("Fn::Cidr").map(|t| t.tag), Some("Cidr"));
    }

    #[test]
    fn test_getatt_splits_on_first_dot() {
        let span = Span::at(Location::new(3, 5));
        let tag = lookup_tag("GetAtt").unwrap();
        let node = rewrite(tag, span, scalar("A.B.C"));

        assert_eq!(node.location(), Location::new(3, 5));
        let (key, operand) = &node.entries()[0];
        assert_eq!(key.raw_value(), Some("Fn::GetAtt"));
        let parts: Vec<_> = operand.items().iter().filter_map(Node::as_str).collect();
        assert_eq!(parts, vec!["A", "B.C"]);
    }

    #[test]
    fn test_getatt_without_dot_stays_scalar() {
        let span = Span::at(Location::new(1, 1));
        let node = rewrite(lookup_tag("GetAtt").unwrap(), span, scalar("Bucket"));
        assert_eq!(node.get("Fn::GetAtt").and_then(Node::as_str), Some("Bucket"));
    }
}
