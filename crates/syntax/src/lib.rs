//! # CloudFormation Syntax
//!
//! A position-preserving reader for CloudFormation templates written in YAML
//! or JSON.
//!
//! The reader produces a lossless [`Node`] tree where every node knows its
//! line and column. CloudFormation short-form intrinsic tags (`!Ref`,
//! `!GetAtt`, `!Sub`, ...) are rewritten to their canonical long form while
//! reading, so downstream code only ever sees one shape:
//!
//! ```
//! let doc = cfn_syntax::parse("Value: !Ref Bucket\n").unwrap();
//! let value = doc.root().get("Value").unwrap();
//! assert_eq!(value.get("Ref").and_then(|n| n.as_str()), Some("Bucket"));
//! ```
//!
//! Duplicate keys are reported as errors rather than merged, and any tag
//! that is neither a CloudFormation intrinsic nor a core YAML tag is
//! rejected.

mod error;
mod node;
mod reader;
mod tags;
mod value;

pub use error::{ParseError, ParseErrorKind, Result};
pub use node::{index_segment, index_to_segment, Node, NodeData, NodeKind, Scalar};
pub use tags::{lookup_key, lookup_tag, IntrinsicTag, INTRINSIC_TAGS};
pub use value::{is_intrinsic_name, Mapping, Value};

use cfn_types::Location;

/// Parse template source text into a document node.
///
/// The returned node has kind [`NodeKind::Document`]; its single child is the
/// root mapping.
#[tracing::instrument(skip(source), fields(len = source.len()))]
pub fn parse(source: &str) -> Result<Node> {
    let document = reader::read(source)?;
    let root = document.root();

    match &root.data {
        NodeData::Mapping(_) => {}
        NodeData::Scalar(scalar) if scalar.value.is_null() && scalar.raw.is_empty() => {
            return Err(ParseError::new(
                ParseErrorKind::EmptyDocument,
                root.location(),
                "Template is empty",
            ));
        }
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::RootNotMapping,
                root.location(),
                format!("Template root must be a mapping, found a {}", kind_name(root.kind())),
            ));
        }
    }

    tracing::debug!(top_level_keys = root.entries().len(), "parsed template");
    Ok(document)
}

/// Parse raw template bytes, rejecting input that is not UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Node> {
    match std::str::from_utf8(bytes) {
        Ok(source) => parse(source),
        Err(err) => {
            let valid = &bytes[..err.valid_up_to()];
            let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
            let line_start = valid.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
            let column = String::from_utf8_lossy(&valid[line_start..]).chars().count() + 1;
            Err(ParseError::new(
                ParseErrorKind::InvalidUtf8,
                Location::new(line as u32, column as u32),
                "Template is not valid UTF-8",
            ))
        }
    }
}

const fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Document => "document",
        NodeKind::Mapping => "mapping",
        NodeKind::Sequence => "sequence",
        NodeKind::Scalar => "scalar",
    }
}
