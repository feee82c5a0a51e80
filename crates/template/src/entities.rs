//! Typed views over the entries of each template section.
//!
//! Every entity keeps the key node it was declared under and the value node
//! holding its body. Entity-level positions are always the key's position.

use cfn_syntax::{Node, NodeKind, Value};
use cfn_types::Location;
use indexmap::IndexMap;

/// Ordered string-keyed generic values (`Properties`, `Metadata`, ...)
pub type ValueMap = cfn_syntax::Mapping;

/// The declaration site shared by every entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Logical ID
    pub name: String,
    /// The key node the entity was declared under
    pub key: Node,
    /// The entity's body
    pub node: Node,
}

impl Declaration {
    pub(crate) fn new(key: &Node, node: &Node) -> Option<Self> {
        Some(Self {
            name: key.raw_value()?.to_string(),
            key: key.clone(),
            node: node.clone(),
        })
    }

    /// Position of the declaring key
    #[must_use]
    pub const fn location(&self) -> Location {
        self.key.location()
    }
}

/// An entry under `Parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub declaration: Declaration,
    /// `Type`, empty when absent
    pub parameter_type: String,
    pub default: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
    pub allowed_pattern: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<i64>,
    pub max_length: Option<i64>,
    pub no_echo: bool,
    pub description: Option<String>,
    pub constraint_description: Option<String>,
}

impl Parameter {
    pub(crate) fn decode(declaration: Declaration) -> Self {
        let body = &declaration.node;
        let value = |key: &str| body.get(key).map(Node::to_value);

        Self {
            parameter_type: value("Type").and_then(|v| scalar_text(&v)).unwrap_or_default(),
            default: value("Default"),
            allowed_values: value("AllowedValues").and_then(|v| match v {
                Value::Sequence(items) => Some(items),
                _ => None,
            }),
            allowed_pattern: value("AllowedPattern").and_then(|v| scalar_text(&v)),
            min_value: value("MinValue").and_then(|v| v.as_f64()),
            max_value: value("MaxValue").and_then(|v| v.as_f64()),
            min_length: value("MinLength").and_then(|v| v.as_i64()),
            max_length: value("MaxLength").and_then(|v| v.as_i64()),
            no_echo: value("NoEcho").and_then(|v| v.as_bool()).unwrap_or(false),
            description: value("Description").and_then(|v| scalar_text(&v)),
            constraint_description: value("ConstraintDescription").and_then(|v| scalar_text(&v)),
            declaration,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.declaration.location()
    }

    /// SSM parameter types resolve at deploy time.
    #[must_use]
    pub fn is_ssm(&self) -> bool {
        self.parameter_type.starts_with("AWS::SSM::Parameter::")
    }

    /// `List<...>` and `CommaDelimitedList` parameters resolve to lists.
    #[must_use]
    pub fn is_list(&self) -> bool {
        self.parameter_type == "CommaDelimitedList"
            || self.parameter_type.starts_with("List<")
            || self.parameter_type.contains("<List<")
    }
}

/// An entry under `Mappings`: top-level key to second-level key to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub declaration: Declaration,
    pub values: IndexMap<String, ValueMap>,
}

impl Mapping {
    pub(crate) fn decode(declaration: Declaration) -> Self {
        let values = declaration
            .node
            .entries()
            .iter()
            .filter_map(|(key, value)| {
                let key = key.raw_value()?.to_string();
                match value.to_value() {
                    Value::Mapping(second) => Some((key, second)),
                    _ => Some((key, ValueMap::new())),
                }
            })
            .collect();
        Self {
            declaration,
            values,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.declaration.location()
    }

    /// Look up `top_key` / `second_key`.
    #[must_use]
    pub fn lookup(&self, top_key: &str, second_key: &str) -> Option<&Value> {
        self.values.get(top_key)?.get(second_key)
    }
}

/// An entry under `Conditions`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub declaration: Declaration,
    pub expression: Value,
}

impl Condition {
    pub(crate) fn decode(declaration: Declaration) -> Self {
        Self {
            expression: declaration.node.to_value(),
            declaration,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.declaration.location()
    }
}

/// An entry under `Resources`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub declaration: Declaration,
    /// `Type`, empty when absent
    pub resource_type: String,
    pub properties: ValueMap,
    /// `DependsOn`, normalised from a scalar or a list
    pub depends_on: Vec<String>,
    pub condition: Option<String>,
    pub metadata: ValueMap,
}

impl Resource {
    pub(crate) fn decode(declaration: Declaration) -> Self {
        let body = &declaration.node;
        let value = |key: &str| body.get(key).map(Node::to_value);

        let depends_on = match value("DependsOn") {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
            Some(other) => scalar_text(&other).into_iter().collect(),
            None => Vec::new(),
        };

        Self {
            resource_type: value("Type").and_then(|v| scalar_text(&v)).unwrap_or_default(),
            properties: value("Properties").map(into_map).unwrap_or_default(),
            condition: value("Condition").and_then(|v| scalar_text(&v)),
            metadata: value("Metadata").map(into_map).unwrap_or_default(),
            depends_on,
            declaration,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.declaration.location()
    }

    /// Read any resource-level attribute from the raw mapping node.
    #[must_use]
    pub fn attribute_node(&self, key: &str) -> Option<&Node> {
        self.declaration.node.get(key)
    }

    /// Key and value nodes of a resource-level attribute
    #[must_use]
    pub fn attribute_entry(&self, key: &str) -> Option<(&Node, &Node)> {
        self.declaration.node.get_entry(key)
    }

    #[must_use]
    pub fn deletion_policy(&self) -> Option<&Node> {
        self.attribute_node("DeletionPolicy")
    }

    #[must_use]
    pub fn update_replace_policy(&self) -> Option<&Node> {
        self.attribute_node("UpdateReplacePolicy")
    }

    /// Returns `true` for `AWS::Serverless::*` resources.
    #[must_use]
    pub fn is_serverless(&self) -> bool {
        self.resource_type.starts_with("AWS::Serverless::")
    }

    /// Returns `true` for custom resources and third-party types.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.resource_type.starts_with("Custom::")
            || self.resource_type == "AWS::CloudFormation::CustomResource"
    }
}

/// An entry under `Outputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub declaration: Declaration,
    pub value: Option<Value>,
    pub description: Option<String>,
    pub export: ValueMap,
    pub condition: Option<String>,
}

impl Output {
    pub(crate) fn decode(declaration: Declaration) -> Self {
        let body = &declaration.node;
        let value = |key: &str| body.get(key).map(Node::to_value);

        Self {
            value: value("Value"),
            description: value("Description").and_then(|v| scalar_text(&v)),
            export: value("Export").map(into_map).unwrap_or_default(),
            condition: value("Condition").and_then(|v| scalar_text(&v)),
            declaration,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    #[must_use]
    pub const fn location(&self) -> Location {
        self.declaration.location()
    }
}

/// Text of a scalar value; numbers and booleans are rendered.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn into_map(value: Value) -> ValueMap {
    match value {
        Value::Mapping(map) => map,
        _ => ValueMap::new(),
    }
}

/// Decode every entry of a section mapping with `decode`.
pub(crate) fn decode_section<T>(
    section: Option<&Node>,
    decode: impl Fn(Declaration) -> T,
) -> IndexMap<String, T> {
    let Some(section) = section.filter(|node| node.kind() == NodeKind::Mapping) else {
        return IndexMap::new();
    };
    section
        .entries()
        .iter()
        .filter_map(|(key, value)| Declaration::new(key, value))
        .map(|declaration| (declaration.name.clone(), decode(declaration)))
        .collect()
}
