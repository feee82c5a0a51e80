//! The root template façade.

use cfn_syntax::{index_segment, Node, NodeKind, ParseError, Value};
use cfn_types::{Location, Span};
use indexmap::IndexMap;

use crate::entities::{
    decode_section, scalar_text, Condition, Mapping, Output, Parameter, Resource, ValueMap,
};

/// Top-level sections CloudFormation accepts.
pub const TOP_LEVEL_SECTIONS: &[&str] = &[
    "AWSTemplateFormatVersion",
    "Description",
    "Metadata",
    "Parameters",
    "Rules",
    "Mappings",
    "Conditions",
    "Transform",
    "Resources",
    "Outputs",
    "Hooks",
    "Globals",
];

/// A parsed CloudFormation template.
///
/// Built once from source and never mutated; rules only read it. Every
/// typed section preserves source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// File the template was read from (empty for in-memory input)
    pub source_filename: String,
    /// The root mapping node
    pub root: Node,
    pub format_version: Option<String>,
    pub description: Option<String>,
    /// `Transform`: a name, a list of names, or anything else
    pub transform: Option<Value>,
    pub metadata: ValueMap,
    pub parameters: IndexMap<String, Parameter>,
    pub mappings: IndexMap<String, Mapping>,
    pub conditions: IndexMap<String, Condition>,
    pub resources: IndexMap<String, Resource>,
    pub outputs: IndexMap<String, Output>,
}

impl Template {
    /// Parse template source text.
    #[tracing::instrument(skip(source))]
    pub fn from_source(source: &str, filename: &str) -> Result<Self, ParseError> {
        let document = cfn_syntax::parse(source)?;
        Ok(Self::from_node(&document, filename))
    }

    /// Parse raw template bytes.
    pub fn from_bytes(bytes: &[u8], filename: &str) -> Result<Self, ParseError> {
        let document = cfn_syntax::parse_bytes(bytes)?;
        Ok(Self::from_node(&document, filename))
    }

    /// Decode an already-parsed document (or root mapping) node.
    #[must_use]
    pub fn from_node(document: &Node, filename: &str) -> Self {
        let root = document.root().clone();
        let section_value = |name: &str| root.get(name).map(Node::to_value);

        let template = Self {
            source_filename: filename.to_string(),
            format_version: section_value("AWSTemplateFormatVersion").and_then(|v| scalar_text(&v)),
            description: section_value("Description").and_then(|v| scalar_text(&v)),
            transform: section_value("Transform"),
            metadata: match section_value("Metadata") {
                Some(Value::Mapping(map)) => map,
                _ => ValueMap::new(),
            },
            parameters: decode_section(root.get("Parameters"), Parameter::decode),
            mappings: decode_section(root.get("Mappings"), Mapping::decode),
            conditions: decode_section(root.get("Conditions"), Condition::decode),
            resources: decode_section(root.get("Resources"), Resource::decode),
            outputs: decode_section(root.get("Outputs"), Output::decode),
            root,
        };

        tracing::debug!(
            parameters = template.parameters.len(),
            resources = template.resources.len(),
            outputs = template.outputs.len(),
            "decoded template"
        );
        template
    }

    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    #[must_use]
    pub fn has_mapping(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    #[must_use]
    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    #[must_use]
    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    #[must_use]
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    #[must_use]
    pub fn get_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    #[must_use]
    pub fn get_mapping(&self, name: &str) -> Option<&Mapping> {
        self.mappings.get(name)
    }

    #[must_use]
    pub fn get_condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    #[must_use]
    pub fn get_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    #[must_use]
    pub fn get_output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Iterate parameters in source order
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(name, p)| (name.as_str(), p))
    }

    /// Iterate mappings in source order
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &Mapping)> {
        self.mappings.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Iterate conditions in source order
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(name, c)| (name.as_str(), c))
    }

    /// Iterate resources in source order
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Iterate outputs in source order
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.outputs.iter().map(|(name, o)| (name.as_str(), o))
    }

    /// The raw node of any top-level section, known or not.
    #[must_use]
    pub fn section_node(&self, name: &str) -> Option<&Node> {
        self.root.get(name)
    }

    /// Key and value nodes of a top-level section
    #[must_use]
    pub fn section_entry(&self, name: &str) -> Option<(&Node, &Node)> {
        self.root.get_entry(name)
    }

    /// Top-level keys in source order
    pub fn top_level_keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Transform names, whether declared as a scalar or a list.
    #[must_use]
    pub fn transforms(&self) -> Vec<&str> {
        match &self.transform {
            Some(Value::String(name)) => vec![name.as_str()],
            Some(Value::Sequence(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Canonical JSON form of the whole template, in source order.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_value().to_json()
    }

    /// The node reached by following `path` from the root.
    #[must_use]
    pub fn node_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        self.root.find_path(path)
    }

    /// Source position for a finding at `path`.
    ///
    /// Mapping steps resolve to the key's position, sequence steps to the
    /// item's. When the path leaves the tree, the deepest position reached
    /// is returned.
    #[must_use]
    pub fn location_of<S: AsRef<str>>(&self, path: &[S]) -> Location {
        self.resolve(path).0
    }

    /// Span covering the element at `path`: from its key (for mapping
    /// steps) to the end of its value.
    #[must_use]
    pub fn span_of<S: AsRef<str>>(&self, path: &[S]) -> Option<Span> {
        let (_, span, complete) = self.resolve(path);
        complete.then_some(span)
    }

    fn resolve<S: AsRef<str>>(&self, path: &[S]) -> (Location, Span, bool) {
        let mut node = &self.root;
        let mut location = self.root.location();
        let mut span = self.root.span;

        for segment in path {
            let segment = segment.as_ref();
            let step = match index_segment(segment) {
                Some(index) if node.kind() == NodeKind::Sequence => {
                    node.items().get(index).map(|item| (item.location(), item))
                }
                _ => node
                    .get_entry(segment)
                    .map(|(key, value)| (key.location(), value)),
            };
            let Some((at, next)) = step else {
                return (location, span, false);
            };
            location = at;
            span = Span::new(at, next.span.end.max(at));
            node = next;
        }
        (location, span, true)
    }
}
