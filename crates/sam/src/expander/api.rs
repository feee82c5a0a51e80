//! `AWS::Serverless::Api`, `AWS::Serverless::HttpApi` and the implicit APIs
//! created for function `Api`/`HttpApi` events.

use indexmap::IndexMap;
use serde_json::{json, Value as Json};

use super::globals::Globals;
use super::{reference, tag_list, Expansion, JsonMap, ResourceAttributes, Source};
use crate::error::ExpansionError;

pub(crate) const IMPLICIT_REST_API: &str = "ServerlessRestApi";
pub(crate) const IMPLICIT_HTTP_API: &str = "ServerlessHttpApi";

/// A route contributed by a function event.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    pub path: String,
    pub method: String,
    /// Logical ID whose ARN the integration invokes
    pub target: String,
}

/// Routes collected per API while functions are expanded.
#[derive(Debug, Default)]
pub(crate) struct ImplicitApis {
    rest: IndexMap<String, Vec<Route>>,
    http: IndexMap<String, Vec<Route>>,
}

impl ImplicitApis {
    pub fn add_rest(&mut self, api_id: String, route: Route) {
        self.rest.entry(api_id).or_default().push(route);
    }

    pub fn add_http(&mut self, api_id: String, route: Route) {
        self.http.entry(api_id).or_default().push(route);
    }

    /// Create the implicit APIs that were used, then attach every route to
    /// its API's generated definition.
    pub fn finish(self, globals: &Globals, expansion: &mut Expansion) -> Result<(), ExpansionError> {
        for (api_id, routes) in self.rest {
            if !expansion.contains(&api_id) {
                if api_id != IMPLICIT_REST_API {
                    continue;
                }
                let mut properties = JsonMap::new();
                properties.insert("StageName".to_string(), json!("Prod"));
                globals.apply("Api", &mut properties);
                expand_rest_api(&implicit_source(IMPLICIT_REST_API, properties), expansion)?;
            }
            attach_routes(expansion, &api_id, &routes, false);
        }

        for (api_id, routes) in self.http {
            if !expansion.contains(&api_id) {
                if api_id != IMPLICIT_HTTP_API {
                    continue;
                }
                let mut properties = JsonMap::new();
                globals.apply("HttpApi", &mut properties);
                expand_http_api(&implicit_source(IMPLICIT_HTTP_API, properties), expansion)?;
            }
            attach_routes(expansion, &api_id, &routes, true);
        }
        Ok(())
    }
}

fn implicit_source(logical_id: &'static str, properties: JsonMap) -> Source<'static> {
    Source {
        logical_id,
        attributes: ResourceAttributes::default(),
        properties,
    }
}

/// The API a function event targets: its `RestApiId`/`ApiId`, or the implicit one.
pub(crate) fn target_api(properties: Option<&Json>, key: &str, implicit: &str) -> String {
    match properties.and_then(|p| p.get(key)) {
        Some(Json::String(id)) => id.clone(),
        Some(Json::Object(map)) => map
            .get("Ref")
            .and_then(Json::as_str)
            .map_or_else(|| implicit.to_string(), str::to_string),
        _ => implicit.to_string(),
    }
}

pub(crate) fn expand_rest_api(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let Some(stage_name) = source.property("StageName").cloned() else {
        return Err(source.invalid("Missing required property 'StageName'."));
    };

    let mut api = JsonMap::new();
    source.pass_through(
        &mut api,
        &[
            "Name",
            "Description",
            "BinaryMediaTypes",
            "MinimumCompressionSize",
            "Mode",
            "DisableExecuteApiEndpoint",
            "ApiKeySourceType",
        ],
    );
    match (source.property("DefinitionBody"), source.property("DefinitionUri")) {
        (Some(body), _) => {
            api.insert("Body".to_string(), body.clone());
        }
        (None, Some(uri)) => {
            api.insert("BodyS3Location".to_string(), s3_location(uri, "Bucket", "Key", "Version"));
        }
        (None, None) => {
            api.insert(
                "Body".to_string(),
                json!({
                    "swagger": "2.0",
                    "info": {"version": "1.0", "title": reference("AWS::StackName")},
                    "paths": {}
                }),
            );
        }
    }
    if let Some(endpoint) = source.property("EndpointConfiguration") {
        let endpoint = match endpoint {
            Json::String(kind) => json!({ "Types": [kind] }),
            other => other.clone(),
        };
        api.insert("EndpointConfiguration".to_string(), endpoint);
    }
    if source.property("Tags").is_some() {
        api.insert("Tags".to_string(), tag_list(source.property("Tags"), None));
    }
    expansion.primary(source, "AWS::ApiGateway::RestApi", api);

    let deployment_id = source.child_id("Deployment");
    let mut deployment = JsonMap::new();
    deployment.insert("RestApiId".to_string(), reference(source.logical_id));
    deployment.insert("Description".to_string(), json!(format!("RestApi deployment for {}", source.logical_id)));
    deployment.insert("StageName".to_string(), json!("Stage"));
    expansion.child(source, &deployment_id, "AWS::ApiGateway::Deployment", deployment);

    let mut stage = JsonMap::new();
    stage.insert("DeploymentId".to_string(), reference(&deployment_id));
    stage.insert("RestApiId".to_string(), reference(source.logical_id));
    source.pass_through(
        &mut stage,
        &[
            "Variables",
            "MethodSettings",
            "TracingEnabled",
            "CacheClusterEnabled",
            "CacheClusterSize",
            "AccessLogSetting",
            "CanarySetting",
        ],
    );
    let stage_id = source.child_id(&format!("{}Stage", id_fragment(&stage_name, "")));
    stage.insert("StageName".to_string(), stage_name);
    expansion.child(source, &stage_id, "AWS::ApiGateway::Stage", stage);
    Ok(())
}

pub(crate) fn expand_http_api(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let mut api = JsonMap::new();
    source.pass_through(&mut api, &["Name", "Description", "DisableExecuteApiEndpoint", "FailOnWarnings"]);
    match (source.property("DefinitionBody"), source.property("DefinitionUri")) {
        (Some(body), _) => {
            api.insert("Body".to_string(), body.clone());
        }
        (None, Some(uri)) => {
            api.insert("BodyS3Location".to_string(), s3_location(uri, "Bucket", "Key", "Version"));
        }
        (None, None) => {
            api.insert(
                "Body".to_string(),
                json!({
                    "openapi": "3.0.1",
                    "info": {"version": "1.0", "title": reference("AWS::StackName")},
                    "paths": {}
                }),
            );
        }
    }
    let mut tags = source
        .property("Tags")
        .and_then(Json::as_object)
        .cloned()
        .unwrap_or_default();
    tags.insert("httpapi:createdBy".to_string(), json!("SAM"));
    api.insert("Tags".to_string(), Json::Object(tags));
    expansion.primary(source, "AWS::ApiGatewayV2::Api", api);

    let stage_name = source.property("StageName").cloned().unwrap_or_else(|| json!("$default"));
    let stage_id = match &stage_name {
        Json::String(name) if name == "$default" => source.child_id("ApiGatewayDefaultStage"),
        other => source.child_id(&format!("{}Stage", id_fragment(other, ""))),
    };
    let mut stage = JsonMap::new();
    stage.insert("ApiId".to_string(), reference(source.logical_id));
    stage.insert("StageName".to_string(), stage_name);
    stage.insert("AutoDeploy".to_string(), json!(true));
    source.pass_through(
        &mut stage,
        &["StageVariables", "AccessLogSettings", "DefaultRouteSettings", "RouteSettings"],
    );
    expansion.child(source, &stage_id, "AWS::ApiGatewayV2::Stage", stage);
    Ok(())
}

/// Insert routes into the generated `Body.paths` of an API. APIs defined by
/// an external document are left untouched.
fn attach_routes(expansion: &mut Expansion, api_id: &str, routes: &[Route], http: bool) {
    let Some(paths) = expansion
        .get_mut(api_id)
        .and_then(|api| api.get_mut("Properties"))
        .and_then(|properties| properties.get_mut("Body"))
        .and_then(|body| body.get_mut("paths"))
        .and_then(Json::as_object_mut)
    else {
        return;
    };

    for route in routes {
        let method = match route.method.to_ascii_lowercase().as_str() {
            "any" => "x-amazon-apigateway-any-method".to_string(),
            other => other.to_string(),
        };
        let mut integration = json!({
            "httpMethod": "POST",
            "type": "aws_proxy",
            "uri": {
                "Fn::Sub": format!(
                    "arn:${{AWS::Partition}}:apigateway:${{AWS::Region}}:lambda:path/2015-03-31/functions/${{{}.Arn}}/invocations",
                    route.target
                )
            }
        });
        if http {
            integration["payloadFormatVersion"] = json!("2.0");
        }

        let entry = paths
            .entry(route.path.clone())
            .or_insert_with(|| Json::Object(JsonMap::new()));
        if let Some(operations) = entry.as_object_mut() {
            operations.insert(
                method,
                json!({ "x-amazon-apigateway-integration": integration, "responses": {} }),
            );
        }
    }
}

/// An `s3://bucket/key` URI or a `{Bucket, Key, Version}` object, renamed.
pub(crate) fn s3_location(uri: &Json, bucket: &str, key: &str, version: &str) -> Json {
    match uri {
        Json::String(text) => {
            let (bucket_name, object_key) = text
                .strip_prefix("s3://")
                .and_then(|rest| rest.split_once('/'))
                .unwrap_or(("bucket", "value"));
            json!({ bucket: bucket_name, key: object_key })
        }
        Json::Object(map) => {
            let mut location = JsonMap::new();
            for (from, to) in [("Bucket", bucket), ("Key", key), ("Version", version)] {
                if let Some(value) = map.get(from) {
                    location.insert(to.to_string(), value.clone());
                }
            }
            Json::Object(location)
        }
        other => other.clone(),
    }
}

/// Alphanumeric fragment of a value for use inside a logical ID.
pub(crate) fn id_fragment(value: &Json, fallback: &str) -> String {
    let fragment: String = value
        .as_str()
        .unwrap_or(fallback)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if fragment.is_empty() {
        fallback.to_string()
    } else {
        fragment
    }
}
