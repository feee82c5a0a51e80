//! Macro expansion: the `MacroExpander` seam and the built-in serverless
//! expander.
//!
//! Expanders work on serialised templates (bytes in, bytes out) so an
//! external implementation can be dropped in without sharing types.

mod api;
mod function;
mod globals;
mod policies;
mod resources;

pub(crate) use api::{IMPLICIT_HTTP_API, IMPLICIT_REST_API};

use serde_json::{json, Map, Value as Json};

use crate::context::TransformContext;
use crate::detect::SERVERLESS_TRANSFORM;
use crate::error::ExpansionError;

pub(crate) type JsonMap = Map<String, Json>;

/// Expands a macro-flavoured template into plain CloudFormation.
pub trait MacroExpander: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Expand `template` (a JSON document) into another JSON document.
    fn expand(&self, template: &[u8], context: &TransformContext) -> Result<Vec<u8>, ExpansionError>;
}

/// Built-in expander for `AWS::Serverless-2016-10-31`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerlessExpander;

impl MacroExpander for ServerlessExpander {
    fn name(&self) -> &'static str {
        "serverless"
    }

    fn expand(&self, template: &[u8], context: &TransformContext) -> Result<Vec<u8>, ExpansionError> {
        let document: Json = serde_json::from_slice(template)
            .map_err(|err| ExpansionError::new(format!("Template is not valid JSON: {err}")))?;
        let Json::Object(mut root) = document else {
            return Err(ExpansionError::new("Template root must be an object"));
        };

        remove_serverless_transform(&mut root);
        let globals = globals::Globals::take(&mut root)?;

        let resources = match root.remove("Resources") {
            Some(Json::Object(resources)) => resources,
            Some(_) => return Err(ExpansionError::new("'Resources' section must be an object")),
            None => JsonMap::new(),
        };

        let mut expansion = Expansion::default();
        let mut apis = api::ImplicitApis::default();
        for (logical_id, resource) in resources {
            expand_resource(&logical_id, resource, &globals, &mut apis, &mut expansion)?;
        }
        apis.finish(&globals, &mut expansion)?;

        root.insert("Resources".to_string(), Json::Object(expansion.resources));
        let mut output = Json::Object(root);
        substitute_pseudo_parameters(&mut output, context);

        tracing::debug!(expander = self.name(), "expanded serverless template");
        serde_json::to_vec_pretty(&output)
            .map_err(|err| ExpansionError::new(format!("Failed to write expanded template: {err}")))
    }
}

fn expand_resource(
    logical_id: &str,
    resource: Json,
    globals: &globals::Globals,
    apis: &mut api::ImplicitApis,
    expansion: &mut Expansion,
) -> Result<(), ExpansionError> {
    let Json::Object(mut resource) = resource else {
        expansion.insert(logical_id, resource);
        return Ok(());
    };
    let resource_type = resource.get("Type").and_then(Json::as_str).unwrap_or_default().to_string();
    let Some(kind) = resource_type.strip_prefix("AWS::Serverless::") else {
        expansion.insert(logical_id, Json::Object(resource));
        return Ok(());
    };

    let mut properties = match resource.remove("Properties") {
        Some(Json::Object(properties)) => properties,
        None | Some(Json::Null) => JsonMap::new(),
        Some(_) => {
            return Err(ExpansionError::invalid_resource(logical_id, "'Properties' must be an object."))
        }
    };
    globals.apply(kind, &mut properties);

    let source = Source {
        logical_id,
        attributes: ResourceAttributes::take(&mut resource),
        properties,
    };

    match kind {
        "Function" => function::expand(&source, apis, expansion),
        "Api" => api::expand_rest_api(&source, expansion),
        "HttpApi" => api::expand_http_api(&source, expansion),
        "SimpleTable" => resources::expand_simple_table(&source, expansion),
        "LayerVersion" => resources::expand_layer_version(&source, expansion),
        "Application" => resources::expand_application(&source, expansion),
        "StateMachine" => resources::expand_state_machine(&source, expansion),
        "Connector" => resources::expand_connector(&source, expansion),
        "GraphQLApi" => resources::expand_graphql_api(&source, expansion),
        other => Err(ExpansionError::invalid_resource(
            logical_id,
            format!("Unsupported resource type 'AWS::Serverless::{other}'."),
        )),
    }
}

/// One serverless resource being expanded.
pub(crate) struct Source<'a> {
    pub logical_id: &'a str,
    pub attributes: ResourceAttributes,
    pub properties: JsonMap,
}

impl Source<'_> {
    pub fn property(&self, key: &str) -> Option<&Json> {
        self.properties.get(key).filter(|value| !value.is_null())
    }

    /// Child logical ID: the source ID plus a suffix.
    pub fn child_id(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.logical_id)
    }

    pub fn invalid(&self, reason: impl std::fmt::Display) -> ExpansionError {
        ExpansionError::invalid_resource(self.logical_id, reason)
    }

    /// Copy the listed properties unchanged into `target`.
    pub fn pass_through(&self, target: &mut JsonMap, keys: &[&str]) {
        for key in keys {
            if let Some(value) = self.property(key) {
                target.insert((*key).to_string(), value.clone());
            }
        }
    }
}

/// Resource-level attributes carried onto generated resources.
#[derive(Debug, Default, Clone)]
pub(crate) struct ResourceAttributes {
    condition: Option<Json>,
    depends_on: Option<Json>,
    metadata: Option<Json>,
    deletion_policy: Option<Json>,
    update_replace_policy: Option<Json>,
}

impl ResourceAttributes {
    fn take(resource: &mut JsonMap) -> Self {
        Self {
            condition: resource.remove("Condition"),
            depends_on: resource.remove("DependsOn"),
            metadata: resource.remove("Metadata"),
            deletion_policy: resource.remove("DeletionPolicy"),
            update_replace_policy: resource.remove("UpdateReplacePolicy"),
        }
    }
}

/// The resources produced so far, in output order.
#[derive(Debug, Default)]
pub(crate) struct Expansion {
    resources: JsonMap,
}

impl Expansion {
    pub fn insert(&mut self, logical_id: &str, resource: Json) {
        self.resources.insert(logical_id.to_string(), resource);
    }

    /// Add the primary resource of a source, carrying every attribute.
    pub fn primary(&mut self, source: &Source<'_>, resource_type: &str, properties: JsonMap) {
        self.primary_as(source, source.logical_id, resource_type, properties);
    }

    /// Add a primary resource under a different logical ID.
    pub fn primary_as(
        &mut self,
        source: &Source<'_>,
        logical_id: &str,
        resource_type: &str,
        properties: JsonMap,
    ) {
        let mut resource = new_resource(resource_type, properties);
        let attributes = &source.attributes;
        for (key, value) in [
            ("Condition", &attributes.condition),
            ("DependsOn", &attributes.depends_on),
            ("Metadata", &attributes.metadata),
            ("DeletionPolicy", &attributes.deletion_policy),
            ("UpdateReplacePolicy", &attributes.update_replace_policy),
        ] {
            if let Some(value) = value {
                resource.insert(key.to_string(), value.clone());
            }
        }
        self.resources.insert(logical_id.to_string(), Json::Object(resource));
    }

    /// Add a supporting resource; only the source's `Condition` carries over.
    pub fn child(&mut self, source: &Source<'_>, logical_id: &str, resource_type: &str, properties: JsonMap) {
        let mut resource = new_resource(resource_type, properties);
        if let Some(condition) = &source.attributes.condition {
            resource.insert("Condition".to_string(), condition.clone());
        }
        self.resources.insert(logical_id.to_string(), Json::Object(resource));
    }

    pub fn get_mut(&mut self, logical_id: &str) -> Option<&mut JsonMap> {
        self.resources.get_mut(logical_id).and_then(Json::as_object_mut)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }
}

fn new_resource(resource_type: &str, properties: JsonMap) -> JsonMap {
    let mut resource = JsonMap::new();
    resource.insert("Type".to_string(), Json::String(resource_type.to_string()));
    resource.insert("Properties".to_string(), Json::Object(properties));
    resource
}

pub(crate) fn reference(name: &str) -> Json {
    json!({ "Ref": name })
}

pub(crate) fn get_att(name: &str, attribute: &str) -> Json {
    json!({ "Fn::GetAtt": [name, attribute] })
}

/// `{"Key": k, "Value": v}` list from a tag map, plus the SAM marker tag.
pub(crate) fn tag_list(tags: Option<&Json>, marker: Option<(&str, &str)>) -> Json {
    let mut list = Vec::new();
    if let Some((key, value)) = marker {
        list.push(json!({ "Key": key, "Value": value }));
    }
    match tags {
        Some(Json::Object(map)) => {
            for (key, value) in map {
                list.push(json!({ "Key": key, "Value": value }));
            }
        }
        Some(Json::Array(items)) => list.extend(items.iter().cloned()),
        _ => {}
    }
    Json::Array(list)
}

fn remove_serverless_transform(root: &mut JsonMap) {
    match root.get_mut("Transform") {
        Some(Json::String(name)) if name == SERVERLESS_TRANSFORM => {
            root.remove("Transform");
        }
        Some(Json::Array(items)) => {
            items.retain(|item| item.as_str() != Some(SERVERLESS_TRANSFORM));
            if items.is_empty() {
                root.remove("Transform");
            }
        }
        _ => {}
    }
}

/// Replace `Ref`s to known pseudo-parameters, and their `${...}` uses in
/// `Fn::Sub` strings, with the context's values. A `Fn::Sub` string that
/// had pseudo-parameters and is left without variables collapses to the
/// plain string; one that never had any is kept as written.
fn substitute_pseudo_parameters(value: &mut Json, context: &TransformContext) {
    let replacement = match value {
        Json::Object(map) if map.len() == 1 => match map.iter().next() {
            Some((key, Json::String(name))) if key == "Ref" => context.pseudo_value(name).map(str::to_string),
            Some((key, Json::String(text))) if key == "Fn::Sub" => {
                let substituted = substitute_text(text, context);
                (substituted != *text && !substituted.contains("${")).then_some(substituted)
            }
            _ => None,
        },
        _ => None,
    };
    if let Some(replacement) = replacement {
        *value = Json::String(replacement);
        return;
    }

    match value {
        Json::Object(map) => {
            if map.len() == 1 {
                match map.get_mut("Fn::Sub") {
                    Some(Json::String(text)) => *text = substitute_text(text, context),
                    Some(Json::Array(items)) => {
                        if let Some(Json::String(text)) = items.first_mut() {
                            *text = substitute_text(text, context);
                        }
                    }
                    _ => {}
                }
            }
            for child in map.values_mut() {
                substitute_pseudo_parameters(child, context);
            }
        }
        Json::Array(items) => {
            for child in items {
                substitute_pseudo_parameters(child, context);
            }
        }
        _ => {}
    }
}

fn substitute_text(text: &str, context: &TransformContext) -> String {
    let mut out = text.to_string();
    for name in ["AWS::Region", "AWS::AccountId", "AWS::StackName", "AWS::Partition"] {
        if let Some(replacement) = context.pseudo_value(name) {
            out = out.replace(&format!("${{{name}}}"), replacement);
        }
    }
    out
}
