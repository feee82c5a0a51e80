//! Event-driven construction of the positioned node tree.
//!
//! The tree is built directly from `saphyr-parser` events rather than from a
//! loaded YAML value so that duplicate keys can be reported instead of
//! silently merged, and so that every node keeps its source span.

use std::collections::HashMap;

use cfn_types::{Location, Span};
use saphyr_parser::{Event, Marker, Parser, ScalarStyle};

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::node::{Node, NodeData, Scalar};
use crate::tags::{lookup_tag, rewrite, IntrinsicTag};
use crate::value::Value;

const CORE_SCHEMA_HANDLES: &[&str] = &["tag:yaml.org,2002:", "!!"];

/// How a node's tag affects the node being built.
#[derive(Debug, Clone, Copy)]
enum NodeTag {
    Intrinsic(&'static IntrinsicTag),
    Str,
    Int,
    Float,
    Bool,
    Null,
    /// `!!seq`, `!!map`, `!!binary`: accepted, no effect
    Core,
}

enum Frame {
    Sequence {
        start: Location,
        anchor: usize,
        tag: Option<NodeTag>,
        items: Vec<Node>,
    },
    Mapping {
        start: Location,
        anchor: usize,
        tag: Option<NodeTag>,
        entries: Vec<(Node, Node)>,
        pending_key: Option<Node>,
        seen: HashMap<String, Location>,
    },
}

/// Builds a single document node from the event stream.
struct TreeBuilder<'a> {
    lines: Vec<&'a str>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Node>,
    documents: usize,
    root: Option<Node>,
}

fn location(marker: &Marker) -> Location {
    Location::new(marker.line() as u32, marker.col() as u32 + 1)
}

/// Read `source` into a document node whose child is the root node.
pub(crate) fn read(source: &str) -> Result<Node> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    // JSON templates are often tab-indented, which YAML forbids.
    let normalized;
    let text = if source.trim_start().starts_with('{') && source.contains('\t') {
        normalized = source.replace('\t', " ");
        normalized.as_str()
    } else {
        source
    };

    let mut builder = TreeBuilder {
        lines: text.lines().collect(),
        stack: Vec::new(),
        anchors: HashMap::new(),
        documents: 0,
        root: None,
    };

    for item in Parser::new_from_str(text) {
        let (event, span) = item?;
        builder.on_event(event, location(&span.start), location(&span.end))?;
    }

    builder.finish()
}

impl TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, start: Location, end: Location) -> Result<()> {
        match event {
            Event::DocumentStart(_) => {
                self.documents += 1;
                if self.documents > 1 {
                    return Err(ParseError::new(
                        ParseErrorKind::MultipleDocuments,
                        start,
                        "Templates must contain a single YAML document",
                    ));
                }
            }
            Event::Alias(id) => {
                let node = self.anchors.get(&id).cloned().ok_or_else(|| {
                    ParseError::malformed(start, "Alias refers to an unknown anchor")
                })?;
                self.complete(node, 0)?;
            }
            Event::Scalar(text, style, anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|t| resolve_tag(&t.handle, &t.suffix, start))
                    .transpose()?;
                let raw: String = text.into();
                let plain = matches!(style, ScalarStyle::Plain);
                let value = match tag {
                    Some(NodeTag::Str) => Value::String(raw.clone()),
                    Some(NodeTag::Int | NodeTag::Float | NodeTag::Bool | NodeTag::Null) => {
                        resolve_plain(&raw)
                    }
                    _ if plain => resolve_plain(&raw),
                    _ => Value::String(raw.clone()),
                };
                let node = Node::new(Span::new(start, end), NodeData::Scalar(Scalar { raw, plain, value }));
                let node = self.apply_tag(tag, node);
                self.complete(node, anchor)?;
            }
            Event::SequenceStart(anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|t| resolve_tag(&t.handle, &t.suffix, start))
                    .transpose()?;
                self.stack.push(Frame::Sequence {
                    start,
                    anchor,
                    tag,
                    items: Vec::new(),
                });
            }
            Event::MappingStart(anchor, tag) => {
                let tag = tag
                    .as_ref()
                    .map(|t| resolve_tag(&t.handle, &t.suffix, start))
                    .transpose()?;
                self.stack.push(Frame::Mapping {
                    start,
                    anchor,
                    tag,
                    entries: Vec::new(),
                    pending_key: None,
                    seen: HashMap::new(),
                });
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence {
                    start: seq_start,
                    anchor,
                    tag,
                    items,
                }) => {
                    let node = Node::new(Span::new(seq_start, end), NodeData::Sequence(items));
                    let node = self.apply_tag(tag, node);
                    self.complete(node, anchor)?;
                }
                _ => return Err(ParseError::malformed(start, "Unexpected end of sequence")),
            },
            Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    start: map_start,
                    anchor,
                    tag,
                    entries,
                    ..
                }) => {
                    let node = Node::new(Span::new(map_start, end), NodeData::Mapping(entries));
                    let node = self.apply_tag(tag, node);
                    self.complete(node, anchor)?;
                }
                _ => return Err(ParseError::malformed(start, "Unexpected end of mapping")),
            },
            _ => {}
        }
        Ok(())
    }

    /// Attach a finished node to its parent frame, or make it the root.
    fn complete(&mut self, node: Node, anchor: usize) -> Result<()> {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }

        match self.stack.last_mut() {
            None => {
                self.root = Some(node);
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                seen,
                ..
            }) => match pending_key.take() {
                Some(key) => entries.push((key, node)),
                None => {
                    let Some(text) = node.raw_value() else {
                        return Err(ParseError::malformed(
                            node.location(),
                            "Mapping keys must be scalar strings",
                        ));
                    };
                    if let Some(first) = seen.get(text) {
                        return Err(ParseError::duplicate_key(text, node.location(), *first));
                    }
                    seen.insert(text.to_string(), node.location());
                    *pending_key = Some(node);
                }
            },
        }
        Ok(())
    }

    /// Apply value-affecting tags. Intrinsic tags rewrite the node into long
    /// form positioned at the tag itself.
    fn apply_tag(&self, tag: Option<NodeTag>, node: Node) -> Node {
        match tag {
            Some(NodeTag::Intrinsic(intrinsic)) => {
                let at = self.tag_location(node.location(), intrinsic.tag);
                rewrite(intrinsic, Span::new(at, node.span.end), node)
            }
            _ => node,
        }
    }

    /// Locate the `!Tag` text that precedes a node, on its own line or at
    /// the end of the previous one. Falls back to the node's position.
    fn tag_location(&self, node_at: Location, tag: &str) -> Location {
        let needle = format!("!{tag}");
        let Some(line_index) = (node_at.line as usize).checked_sub(1) else {
            return node_at;
        };
        let Some(line) = self.lines.get(line_index) else {
            return node_at;
        };

        let prefix: String = line
            .chars()
            .take(node_at.column.saturating_sub(1) as usize)
            .collect();
        let prefix = prefix.trim_end();
        if prefix.ends_with(&needle) {
            let column = prefix.chars().count() - needle.chars().count() + 1;
            return Location::new(node_at.line, column as u32);
        }

        if prefix.is_empty() && line_index > 0 {
            if let Some(previous) = self.lines.get(line_index - 1) {
                let previous = previous.trim_end();
                if previous.ends_with(&needle) {
                    let column = previous.chars().count() - needle.chars().count() + 1;
                    return Location::new(node_at.line - 1, column as u32);
                }
            }
        }
        node_at
    }

    fn finish(self) -> Result<Node> {
        let Some(root) = self.root else {
            return Err(ParseError::new(
                ParseErrorKind::EmptyDocument,
                Location::new(1, 1),
                "Template is empty",
            ));
        };
        let span = root.span;
        Ok(Node::new(span, NodeData::Document(Box::new(root))))
    }
}

/// Classify a node tag. Anything other than a CloudFormation short tag or a
/// core-schema tag is rejected.
fn resolve_tag(handle: &str, suffix: &str, at: Location) -> Result<NodeTag> {
    if handle == "!" {
        if let Some(intrinsic) = lookup_tag(suffix) {
            return Ok(NodeTag::Intrinsic(intrinsic));
        }
    } else if CORE_SCHEMA_HANDLES.contains(&handle) {
        match suffix {
            "str" => return Ok(NodeTag::Str),
            "int" => return Ok(NodeTag::Int),
            "float" => return Ok(NodeTag::Float),
            "bool" => return Ok(NodeTag::Bool),
            "null" => return Ok(NodeTag::Null),
            "seq" | "map" | "binary" => return Ok(NodeTag::Core),
            _ => {}
        }
    }

    let written = if handle == "!" {
        format!("!{suffix}")
    } else {
        format!("{handle}{suffix}")
    };
    Err(ParseError::new(
        ParseErrorKind::UnknownIntrinsicTag,
        at,
        format!("Unknown tag '{written}'"),
    ))
}

/// Resolve a plain scalar with the YAML 1.2 core schema.
pub(crate) fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Value::Float(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Value::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Value::Float(f64::NAN),
        _ => {}
    }

    if let Some(hex) = text.strip_prefix("0x") {
        if let Ok(i) = i64::from_str_radix(hex, 16) {
            return Value::Integer(i);
        }
    }
    if let Some(octal) = text.strip_prefix("0o") {
        if let Ok(i) = i64::from_str_radix(octal, 8) {
            return Value::Integer(i);
        }
    }

    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = text.parse::<i64>() {
            return Value::Integer(i);
        }
    }

    if looks_like_float(unsigned) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::String(text.to_string())
}

/// `(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`, sign already stripped.
fn looks_like_float(text: &str) -> bool {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(index) => (&text[..index], Some(&text[index + 1..])),
        None => (text, None),
    };

    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    if !digits(whole) || !digits(fraction) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain_core_schema() {
        assert_eq!(resolve_plain(""), Value::Null);
        assert_eq!(resolve_plain("~"), Value::Null);
        assert_eq!(resolve_plain("true"), Value::Bool(true));
        assert_eq!(resolve_plain("FALSE"), Value::Bool(false));
        assert_eq!(resolve_plain("42"), Value::Integer(42));
        assert_eq!(resolve_plain("-7"), Value::Integer(-7));
        assert_eq!(resolve_plain("0x1F"), Value::Integer(31));
        assert_eq!(resolve_plain("0o17"), Value::Integer(15));
        assert_eq!(resolve_plain("1.5"), Value::Float(1.5));
        assert_eq!(resolve_plain("1e3"), Value::Float(1000.0));
        assert_eq!(resolve_plain(".inf"), Value::Float(f64::INFINITY));
    }

    #[test]
    fn test_resolve_plain_keeps_strings() {
        assert_eq!(resolve_plain("yes"), Value::String("yes".into()));
        assert_eq!(resolve_plain("inf"), Value::String("inf".into()));
        assert_eq!(resolve_plain("nan"), Value::String("nan".into()));
        assert_eq!(resolve_plain("2010-09-09"), Value::String("2010-09-09".into()));
        assert_eq!(resolve_plain("1.2.3"), Value::String("1.2.3".into()));
        assert_eq!(resolve_plain("."), Value::String(".".into()));
        assert_eq!(resolve_plain("e5"), Value::String("e5".into()));
    }

    #[test]
    fn test_resolve_tag() {
        let at = Location::new(1, 1);
        assert!(matches!(resolve_tag("!", "Ref", at), Ok(NodeTag::Intrinsic(_))));
        assert!(matches!(resolve_tag("tag:yaml.org,2002:", "str", at), Ok(NodeTag::Str)));
        let err = resolve_tag("!", "Bogus", at).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownIntrinsicTag);
        assert!(err.message.contains("!Bogus"));
    }
}
