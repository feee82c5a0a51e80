//! Positioned nodes: the lossless tree the reader builds.

use crate::value::{Mapping, Value};
use cfn_types::{Location, Span};

/// The structural kind of a positioned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
}

/// A scalar leaf: the source text plus its resolved value.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    /// The scalar's text as written (quotes removed, escapes applied)
    pub raw: String,
    /// Whether the scalar was written without quotes
    pub plain: bool,
    /// The resolved value (never a sequence or mapping)
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document(Box<Node>),
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

/// A YAML parse-tree element with its source position.
///
/// Mapping entries keep their key nodes and source order. Intrinsic short
/// tags have already been rewritten to their long form by the reader; the
/// rewritten mapping keeps the position of the original tagged node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub span: Span,
    pub data: NodeData,
}

impl Node {
    #[must_use]
    pub const fn new(span: Span, data: NodeData) -> Self {
        Self { span, data }
    }

    /// Create a plain string scalar node.
    #[must_use]
    pub fn string(span: Span, text: impl Into<String>) -> Self {
        let raw = text.into();
        Self::new(
            span,
            NodeData::Scalar(Scalar {
                value: Value::String(raw.clone()),
                raw,
                plain: false,
            }),
        )
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Document(_) => NodeKind::Document,
            NodeData::Mapping(_) => NodeKind::Mapping,
            NodeData::Sequence(_) => NodeKind::Sequence,
            NodeData::Scalar(_) => NodeKind::Scalar,
        }
    }

    /// Start position of this node
    #[must_use]
    pub const fn location(&self) -> Location {
        self.span.start
    }

    /// Line number (1-indexed)
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.span.start.line
    }

    /// Column number (1-indexed)
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.span.start.column
    }

    /// The source text of a scalar node
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Scalar(scalar) => Some(&scalar.raw),
            _ => None,
        }
    }

    /// The string value of a scalar node, if it resolved to a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            NodeData::Scalar(Scalar {
                value: Value::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// The root node of a document, or the node itself otherwise
    #[must_use]
    pub fn root(&self) -> &Self {
        match &self.data {
            NodeData::Document(root) => root,
            _ => self,
        }
    }

    /// Mapping entries in source order
    #[must_use]
    pub fn entries(&self) -> &[(Node, Node)] {
        match &self.data {
            NodeData::Mapping(entries) => entries,
            _ => &[],
        }
    }

    /// Sequence items in source order
    #[must_use]
    pub fn items(&self) -> &[Node] {
        match &self.data {
            NodeData::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Ordered children: key/value alternating for mappings, items for sequences.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        match &self.data {
            NodeData::Document(root) => vec![root.as_ref()],
            NodeData::Mapping(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            NodeData::Sequence(items) => items.iter().collect(),
            NodeData::Scalar(_) => Vec::new(),
        }
    }

    /// Find a mapping entry by key, returning both the key and value nodes
    #[must_use]
    pub fn get_entry(&self, key: &str) -> Option<(&Node, &Node)> {
        self.entries()
            .iter()
            .find(|(k, _)| k.raw_value() == Some(key))
            .map(|(k, v)| (k, v))
    }

    /// Find a mapping value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.get_entry(key).map(|(_, v)| v)
    }

    /// Keys of a mapping node in source order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().iter().filter_map(|(k, _)| k.raw_value())
    }

    /// Follow a path of mapping keys and `[i]` sequence indices.
    #[must_use]
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let mut current = self.root();
        for segment in path {
            let segment = segment.as_ref();
            current = match index_segment(segment) {
                Some(index) if current.kind() == NodeKind::Sequence => current.items().get(index)?,
                _ => current.get(segment)?,
            };
        }
        Some(current)
    }

    /// Decode this node into a position-free generic value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match &self.data {
            NodeData::Document(root) => root.to_value(),
            NodeData::Scalar(scalar) => scalar.value.clone(),
            NodeData::Sequence(items) => Value::Sequence(items.iter().map(Self::to_value).collect()),
            NodeData::Mapping(entries) => {
                let mut map = Mapping::with_capacity(entries.len());
                for (key, value) in entries {
                    if let Some(key) = key.raw_value() {
                        map.insert(key.to_string(), value.to_value());
                    }
                }
                Value::Mapping(map)
            }
        }
    }
}

/// Parse a `[i]` path segment into its index.
#[must_use]
pub fn index_segment(segment: &str) -> Option<usize> {
    segment
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|digits| digits.parse().ok())
}

/// Format a sequence index as a `[i]` path segment.
#[must_use]
pub fn index_to_segment(index: usize) -> String {
    format!("[{index}]")
}
