//! `AWS::Serverless::Function`: the function, its execution role, the
//! optional published alias, event sources and function URL.

use serde_json::{json, Value as Json};

use super::api::{s3_location, target_api, ImplicitApis, Route, IMPLICIT_HTTP_API, IMPLICIT_REST_API};
use super::policies::{execution_role, managed_policy_arn, RoleSpec};
use super::{get_att, reference, tag_list, Expansion, JsonMap, Source};
use crate::error::ExpansionError;

const PASS_THROUGH: &[&str] = &[
    "Description",
    "FunctionName",
    "Handler",
    "Runtime",
    "MemorySize",
    "Timeout",
    "Environment",
    "VpcConfig",
    "Layers",
    "ReservedConcurrentExecutions",
    "KmsKeyArn",
    "Architectures",
    "ImageConfig",
    "EphemeralStorage",
    "FileSystemConfigs",
    "CodeSigningConfigArn",
    "SnapStart",
    "LoggingConfig",
    "RuntimeManagementConfig",
];

/// Event types that become an event source mapping, with the property that
/// names the source and the managed policy the role needs.
const POLLED_SOURCES: &[(&str, &str, Option<&str>)] = &[
    ("SQS", "Queue", Some("service-role/AWSLambdaSQSQueueExecutionRole")),
    ("Kinesis", "Stream", Some("service-role/AWSLambdaKinesisExecutionRole")),
    ("DynamoDB", "Stream", Some("service-role/AWSLambdaDynamoDBExecutionRole")),
    ("MSK", "Stream", Some("service-role/AWSLambdaMSKExecutionRole")),
    ("MQ", "Broker", None),
    ("DocumentDB", "Cluster", None),
    ("SelfManagedKafka", "KafkaBootstrapServers", None),
];

const MAPPING_PASS_THROUGH: &[&str] = &[
    "BatchSize",
    "Enabled",
    "StartingPosition",
    "StartingPositionTimestamp",
    "MaximumBatchingWindowInSeconds",
    "MaximumRetryAttempts",
    "BisectBatchOnFunctionError",
    "ParallelizationFactor",
    "FilterCriteria",
    "FunctionResponseTypes",
    "DestinationConfig",
    "ScalingConfig",
    "Topics",
    "Queues",
];

pub(crate) fn expand(source: &Source<'_>, apis: &mut ImplicitApis, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let events = match source.property("Events") {
        None => JsonMap::new(),
        Some(Json::Object(events)) => events.clone(),
        Some(_) => return Err(source.invalid("Property 'Events' must be an object.")),
    };

    let role_id = source.child_id("Role");
    let mut function = JsonMap::new();
    function.insert("Code".to_string(), code(source)?);
    source.pass_through(&mut function, PASS_THROUGH);
    if source.property("ImageUri").is_some() {
        function.insert("PackageType".to_string(), json!("Image"));
    }
    let role = source
        .property("Role")
        .cloned()
        .unwrap_or_else(|| get_att(&role_id, "Arn"));
    function.insert("Role".to_string(), role);
    if let Some(mode) = source.property("Tracing") {
        function.insert("TracingConfig".to_string(), json!({ "Mode": mode }));
    }
    if let Some(target) = source.property("DeadLetterQueue").and_then(|dlq| dlq.get("TargetArn")) {
        function.insert("DeadLetterConfig".to_string(), json!({ "TargetArn": target }));
    }
    function.insert(
        "Tags".to_string(),
        tag_list(source.property("Tags"), Some(("lambda:createdBy", "SAM"))),
    );
    expansion.primary(source, "AWS::Lambda::Function", function);

    if source.property("Role").is_none() {
        let managed = role_managed_policies(source, &events);
        let spec = RoleSpec {
            service: "lambda.amazonaws.com",
            managed,
            created_by_tag: true,
        };
        let role = execution_role(source, &role_id, spec)?;
        expansion.child(source, &role_id, "AWS::IAM::Role", role);
    }

    let target = publish_alias(source, expansion);

    for (event_id, event) in &events {
        expand_event(source, &target, event_id, event, apis, expansion)?;
    }

    if let Some(url_config) = source.property("FunctionUrlConfig") {
        let mut url = JsonMap::new();
        url.insert("TargetFunctionArn".to_string(), reference(&target));
        for key in ["AuthType", "Cors", "InvokeMode"] {
            if let Some(value) = url_config.get(key) {
                url.insert(key.to_string(), value.clone());
            }
        }
        expansion.child(source, &source.child_id("Url"), "AWS::Lambda::Url", url);

        if url_config.get("AuthType").and_then(Json::as_str) == Some("NONE") {
            let mut permission = JsonMap::new();
            permission.insert("Action".to_string(), json!("lambda:InvokeFunctionUrl"));
            permission.insert("FunctionName".to_string(), reference(&target));
            permission.insert("Principal".to_string(), json!("*"));
            permission.insert("FunctionUrlAuthType".to_string(), json!("NONE"));
            expansion.child(
                source,
                &source.child_id("URLPublicPermissions"),
                "AWS::Lambda::Permission",
                permission,
            );
        }
    }
    Ok(())
}

/// `Code` from `CodeUri`, `InlineCode` or `ImageUri`.
fn code(source: &Source<'_>) -> Result<Json, ExpansionError> {
    let code_uri = source.property("CodeUri");
    let inline = source.property("InlineCode");
    let image = source.property("ImageUri");

    match (code_uri, inline, image) {
        (Some(_), Some(_), _) => Err(source.invalid("Specify either 'CodeUri' or 'InlineCode', not both.")),
        (Some(uri), None, _) => Ok(s3_location(uri, "S3Bucket", "S3Key", "S3ObjectVersion")),
        (None, Some(code), _) => Ok(json!({ "ZipFile": code })),
        (None, None, Some(image)) => Ok(json!({ "ImageUri": image })),
        (None, None, None) => Err(source.invalid("Either 'InlineCode' or 'CodeUri' must be set.")),
    }
}

fn role_managed_policies(source: &Source<'_>, events: &JsonMap) -> Vec<Json> {
    let mut managed = vec![managed_policy_arn("service-role/AWSLambdaBasicExecutionRole")];
    if source.property("Tracing").and_then(Json::as_str) == Some("Active") {
        managed.push(managed_policy_arn("AWSXrayWriteOnlyAccess"));
    }
    if source.property("VpcConfig").is_some() {
        managed.push(managed_policy_arn("service-role/AWSLambdaVPCAccessExecutionRole"));
    }
    for event in events.values() {
        let event_type = event.get("Type").and_then(Json::as_str).unwrap_or_default();
        let policy = POLLED_SOURCES
            .iter()
            .find(|(kind, _, _)| *kind == event_type)
            .and_then(|(_, _, policy)| *policy);
        if let Some(policy) = policy {
            let arn = managed_policy_arn(policy);
            if !managed.contains(&arn) {
                managed.push(arn);
            }
        }
    }
    managed
}

/// Create the version and alias for `AutoPublishAlias`; returns the logical
/// ID event sources should invoke.
fn publish_alias(source: &Source<'_>, expansion: &mut Expansion) -> String {
    let Some(alias) = source.property("AutoPublishAlias").cloned() else {
        return source.logical_id.to_string();
    };

    let version_id = source.child_id("Version");
    let mut version = JsonMap::new();
    version.insert("FunctionName".to_string(), reference(source.logical_id));
    if let Some(description) = source.property("VersionDescription") {
        version.insert("Description".to_string(), description.clone());
    }
    expansion.child(source, &version_id, "AWS::Lambda::Version", version);
    if let Some(resource) = expansion.get_mut(&version_id) {
        resource.insert("DeletionPolicy".to_string(), json!("Retain"));
    }

    let alias_id = source.child_id(&format!("Alias{}", super::api::id_fragment(&alias, "")));
    let mut alias_properties = JsonMap::new();
    alias_properties.insert("Name".to_string(), alias);
    alias_properties.insert("FunctionName".to_string(), reference(source.logical_id));
    alias_properties.insert("FunctionVersion".to_string(), get_att(&version_id, "Version"));
    source.pass_through(&mut alias_properties, &["ProvisionedConcurrencyConfig"]);
    expansion.child(source, &alias_id, "AWS::Lambda::Alias", alias_properties);
    alias_id
}

fn permission(target: &str, principal: &str, source_arn: Option<Json>) -> JsonMap {
    let mut permission = JsonMap::new();
    permission.insert("Action".to_string(), json!("lambda:InvokeFunction"));
    permission.insert("FunctionName".to_string(), reference(target));
    permission.insert("Principal".to_string(), json!(principal));
    if let Some(arn) = source_arn {
        permission.insert("SourceArn".to_string(), arn);
    }
    permission
}

fn expand_event(
    source: &Source<'_>,
    target: &str,
    event_id: &str,
    event: &Json,
    apis: &mut ImplicitApis,
    expansion: &mut Expansion,
) -> Result<(), ExpansionError> {
    let event_type = event.get("Type").and_then(Json::as_str).unwrap_or_default();
    let properties = event.get("Properties");
    let property = |key: &str| properties.and_then(|p| p.get(key)).filter(|v| !v.is_null());
    let resource_id = source.child_id(event_id);
    let permission_id = source.child_id(&format!("{event_id}Permission"));
    let invalid = |reason: String| source.invalid(format!("Event with id [{event_id}] is invalid. {reason}"));

    if let Some((_, arn_key, _)) = POLLED_SOURCES.iter().find(|(kind, _, _)| *kind == event_type) {
        let Some(arn) = property(*arn_key) else {
            return Err(invalid(format!("Missing required property '{arn_key}'.")));
        };
        let mut mapping = JsonMap::new();
        if event_type == "SelfManagedKafka" {
            mapping.insert("SelfManagedEventSource".to_string(), json!({ "Endpoints": { "KafkaBootstrapServers": arn } }));
        } else {
            mapping.insert("EventSourceArn".to_string(), arn.clone());
        }
        mapping.insert("FunctionName".to_string(), reference(target));
        for key in MAPPING_PASS_THROUGH {
            if let Some(value) = property(*key) {
                mapping.insert((*key).to_string(), value.clone());
            }
        }
        expansion.child(source, &resource_id, "AWS::Lambda::EventSourceMapping", mapping);
        return Ok(());
    }

    match event_type {
        "S3" => {
            let Some(bucket) = property("Bucket") else {
                return Err(invalid("Missing required property 'Bucket'.".to_string()));
            };
            let mut s3 = permission(target, "s3.amazonaws.com", None);
            s3.insert("SourceAccount".to_string(), reference("AWS::AccountId"));
            expansion.child(source, &permission_id, "AWS::Lambda::Permission", s3);

            if let Some(bucket_id) = bucket.get("Ref").and_then(Json::as_str) {
                add_bucket_notification(expansion, bucket_id, target, properties, &permission_id);
            }
        }
        "SNS" => {
            let Some(topic) = property("Topic") else {
                return Err(invalid("Missing required property 'Topic'.".to_string()));
            };
            let mut subscription = JsonMap::new();
            subscription.insert("Endpoint".to_string(), get_att(target, "Arn"));
            subscription.insert("Protocol".to_string(), json!("lambda"));
            subscription.insert("TopicArn".to_string(), topic.clone());
            for key in ["FilterPolicy", "FilterPolicyScope", "Region", "RedrivePolicy"] {
                if let Some(value) = property(key) {
                    subscription.insert(key.to_string(), value.clone());
                }
            }
            expansion.child(source, &resource_id, "AWS::SNS::Subscription", subscription);
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "sns.amazonaws.com", Some(topic.clone())),
            );
        }
        "Schedule" | "CloudWatchEvent" | "EventBridgeRule" => {
            let mut rule = JsonMap::new();
            if event_type == "Schedule" {
                let Some(schedule) = property("Schedule") else {
                    return Err(invalid("Missing required property 'Schedule'.".to_string()));
                };
                rule.insert("ScheduleExpression".to_string(), schedule.clone());
                let enabled = property("Enabled").and_then(Json::as_bool).unwrap_or(true);
                rule.insert("State".to_string(), json!(if enabled { "ENABLED" } else { "DISABLED" }));
            } else {
                let Some(pattern) = property("Pattern") else {
                    return Err(invalid("Missing required property 'Pattern'.".to_string()));
                };
                rule.insert("EventPattern".to_string(), pattern.clone());
                if let Some(bus) = property("EventBusName") {
                    rule.insert("EventBusName".to_string(), bus.clone());
                }
            }
            for key in ["Name", "Description", "State"] {
                if let Some(value) = property(key) {
                    rule.insert(key.to_string(), value.clone());
                }
            }
            let mut rule_target = JsonMap::new();
            rule_target.insert("Arn".to_string(), get_att(target, "Arn"));
            rule_target.insert("Id".to_string(), json!(format!("{resource_id}LambdaTarget")));
            if let Some(input) = property("Input") {
                rule_target.insert("Input".to_string(), input.clone());
            }
            rule.insert("Targets".to_string(), Json::Array(vec![Json::Object(rule_target)]));
            expansion.child(source, &resource_id, "AWS::Events::Rule", rule);
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "events.amazonaws.com", Some(get_att(&resource_id, "Arn"))),
            );
        }
        "Api" => {
            let path = property("Path").and_then(Json::as_str);
            let method = property("Method").and_then(Json::as_str);
            let (Some(path), Some(method)) = (path, method) else {
                return Err(invalid("Properties 'Path' and 'Method' are required.".to_string()));
            };
            let api_id = target_api(properties, "RestApiId", IMPLICIT_REST_API);
            let arn = execute_api_arn(&api_id);
            apis.add_rest(
                api_id,
                Route {
                    path: path.to_string(),
                    method: method.to_string(),
                    target: target.to_string(),
                },
            );
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "apigateway.amazonaws.com", Some(arn)),
            );
        }
        "HttpApi" => {
            let path = property("Path").and_then(Json::as_str).unwrap_or("$default");
            let method = property("Method").and_then(Json::as_str).unwrap_or("ANY");
            let api_id = target_api(properties, "ApiId", IMPLICIT_HTTP_API);
            let arn = execute_api_arn(&api_id);
            apis.add_http(
                api_id,
                Route {
                    path: path.to_string(),
                    method: method.to_string(),
                    target: target.to_string(),
                },
            );
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "apigateway.amazonaws.com", Some(arn)),
            );
        }
        "CloudWatchLogs" => {
            let Some(log_group) = property("LogGroupName") else {
                return Err(invalid("Missing required property 'LogGroupName'.".to_string()));
            };
            let mut filter = JsonMap::new();
            filter.insert("DestinationArn".to_string(), get_att(target, "Arn"));
            filter.insert("FilterPattern".to_string(), property("FilterPattern").cloned().unwrap_or_else(|| json!("")));
            filter.insert("LogGroupName".to_string(), log_group.clone());
            expansion.child(source, &resource_id, "AWS::Logs::SubscriptionFilter", filter);
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "logs.amazonaws.com", None),
            );
            if let Some(resource) = expansion.get_mut(&resource_id) {
                resource.insert("DependsOn".to_string(), json!([permission_id]));
            }
        }
        "IoTRule" => {
            let Some(sql) = property("Sql") else {
                return Err(invalid("Missing required property 'Sql'.".to_string()));
            };
            let mut payload = JsonMap::new();
            payload.insert("Sql".to_string(), sql.clone());
            payload.insert("RuleDisabled".to_string(), json!(false));
            payload.insert("Actions".to_string(), json!([{ "Lambda": { "FunctionArn": get_att(target, "Arn") } }]));
            if let Some(version) = property("AwsIotSqlVersion") {
                payload.insert("AwsIotSqlVersion".to_string(), version.clone());
            }
            let mut rule = JsonMap::new();
            rule.insert("TopicRulePayload".to_string(), Json::Object(payload));
            expansion.child(source, &resource_id, "AWS::IoT::TopicRule", rule);
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "iot.amazonaws.com", None),
            );
        }
        "Cognito" => {
            expansion.child(
                source,
                &permission_id,
                "AWS::Lambda::Permission",
                permission(target, "cognito-idp.amazonaws.com", property("UserPool").map(|pool| get_att_of(pool, "Arn"))),
            );
        }
        "AlexaSkill" => {
            let mut alexa = permission(target, "alexa-appkit.amazon.com", None);
            if let Some(skill) = property("SkillId") {
                alexa.insert("EventSourceToken".to_string(), skill.clone());
            }
            expansion.child(source, &permission_id, "AWS::Lambda::Permission", alexa);
        }
        other => {
            return Err(invalid(format!("Type '{other}' is not a supported event type.")));
        }
    }
    Ok(())
}

fn execute_api_arn(api_id: &str) -> Json {
    json!({
        "Fn::Sub": [
            "arn:${AWS::Partition}:execute-api:${AWS::Region}:${AWS::AccountId}:${__ApiId__}/*",
            { "__ApiId__": reference(api_id) }
        ]
    })
}

/// `Fn::GetAtt` of a `Ref`'d resource, or the value unchanged.
fn get_att_of(value: &Json, attribute: &str) -> Json {
    match value.get("Ref").and_then(Json::as_str) {
        Some(name) => get_att(name, attribute),
        None => value.clone(),
    }
}

/// Add a Lambda notification to a bucket declared in the same template.
fn add_bucket_notification(
    expansion: &mut Expansion,
    bucket_id: &str,
    target: &str,
    properties: Option<&Json>,
    permission_id: &str,
) {
    let Some(bucket) = expansion.get_mut(bucket_id) else {
        return;
    };
    if bucket.get("Type").and_then(Json::as_str) != Some("AWS::S3::Bucket") {
        return;
    }

    let events = properties.and_then(|p| p.get("Events")).cloned().unwrap_or_else(|| json!("s3:ObjectCreated:*"));
    let events = match events {
        Json::Array(items) => items,
        other => vec![other],
    };
    let mut configurations = Vec::new();
    for event in events {
        let mut configuration = JsonMap::new();
        configuration.insert("Event".to_string(), event);
        configuration.insert("Function".to_string(), get_att(target, "Arn"));
        if let Some(filter) = properties.and_then(|p| p.get("Filter")) {
            configuration.insert("Filter".to_string(), filter.clone());
        }
        configurations.push(Json::Object(configuration));
    }

    let properties = bucket
        .entry("Properties")
        .or_insert_with(|| Json::Object(JsonMap::new()));
    if let Some(properties) = properties.as_object_mut() {
        let notification = properties
            .entry("NotificationConfiguration")
            .or_insert_with(|| json!({}));
        if let Some(notification) = notification.as_object_mut() {
            let existing = notification
                .entry("LambdaConfigurations")
                .or_insert_with(|| json!([]));
            if let Some(existing) = existing.as_array_mut() {
                existing.extend(configurations);
            }
        }
    }

    let depends_on = bucket.entry("DependsOn").or_insert_with(|| json!([]));
    match depends_on {
        Json::Array(items) => items.push(json!(permission_id)),
        Json::String(single) => {
            let first = single.clone();
            *depends_on = json!([first, permission_id]);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::globals::Globals;
    use crate::expander::ResourceAttributes;

    fn expand_function(properties: Json) -> Result<Expansion, ExpansionError> {
        let source = Source {
            logical_id: "MyFunction",
            attributes: ResourceAttributes::default(),
            properties: properties.as_object().cloned().unwrap(),
        };
        let mut apis = ImplicitApis::default();
        let mut expansion = Expansion::default();
        expand(&source, &mut apis, &mut expansion)?;
        apis.finish(&Globals::default(), &mut expansion)?;
        Ok(expansion)
    }

    fn ids(expansion: &Expansion) -> Vec<String> {
        expansion.resources.keys().cloned().collect()
    }

    #[test]
    fn test_minimal_function() {
        let expansion = expand_function(json!({
            "Runtime": "python3.9",
            "Handler": "i.h",
            "CodeUri": "./s"
        }))
        .unwrap();
        assert_eq!(ids(&expansion), vec!["MyFunction", "MyFunctionRole"]);

        let function = &expansion.resources["MyFunction"];
        assert_eq!(function["Type"], json!("AWS::Lambda::Function"));
        assert_eq!(function["Properties"]["Role"], json!({"Fn::GetAtt": ["MyFunctionRole", "Arn"]}));
        assert_eq!(function["Properties"]["Code"], json!({"S3Bucket": "bucket", "S3Key": "value"}));
        assert_eq!(function["Properties"]["Runtime"], json!("python3.9"));
    }

    #[test]
    fn test_explicit_role_skips_generated_role() {
        let expansion = expand_function(json!({
            "InlineCode": "def h(e, c): pass",
            "Role": "arn:aws:iam::123456789012:role/r"
        }))
        .unwrap();
        assert_eq!(ids(&expansion), vec!["MyFunction"]);
        assert_eq!(
            expansion.resources["MyFunction"]["Properties"]["Code"],
            json!({"ZipFile": "def h(e, c): pass"})
        );
    }

    #[test]
    fn test_missing_code_is_an_error() {
        let err = expand_function(json!({"Runtime": "python3.9"})).unwrap_err();
        assert!(err.message.starts_with("Resource with id [MyFunction] is invalid."));
    }

    #[test]
    fn test_auto_publish_alias() {
        let expansion = expand_function(json!({
            "CodeUri": "s3://b/k.zip",
            "AutoPublishAlias": "live",
            "Events": {"Queue": {"Type": "SQS", "Properties": {"Queue": "arn:aws:sqs:us-east-1:1:q"}}}
        }))
        .unwrap();
        assert_eq!(
            ids(&expansion),
            vec!["MyFunction", "MyFunctionRole", "MyFunctionVersion", "MyFunctionAliaslive", "MyFunctionQueue"]
        );
        assert_eq!(expansion.resources["MyFunctionVersion"]["DeletionPolicy"], json!("Retain"));
        assert_eq!(
            expansion.resources["MyFunctionQueue"]["Properties"]["FunctionName"],
            json!({"Ref": "MyFunctionAliaslive"})
        );
        let managed = &expansion.resources["MyFunctionRole"]["Properties"]["ManagedPolicyArns"];
        assert_eq!(managed.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_api_event_creates_implicit_api() {
        let expansion = expand_function(json!({
            "CodeUri": "./s",
            "Events": {"Get": {"Type": "Api", "Properties": {"Path": "/items", "Method": "get"}}}
        }))
        .unwrap();
        assert_eq!(
            ids(&expansion),
            vec![
                "MyFunction",
                "MyFunctionRole",
                "MyFunctionGetPermission",
                "ServerlessRestApi",
                "ServerlessRestApiDeployment",
                "ServerlessRestApiProdStage"
            ]
        );
        let paths = &expansion.resources["ServerlessRestApi"]["Properties"]["Body"]["paths"];
        assert!(paths["/items"].get("get").is_some());
    }

    #[test]
    fn test_schedule_and_sns_events() {
        let expansion = expand_function(json!({
            "CodeUri": "./s",
            "Events": {
                "Nightly": {"Type": "Schedule", "Properties": {"Schedule": "rate(1 day)", "Enabled": false}},
                "Topic": {"Type": "SNS", "Properties": {"Topic": {"Ref": "Alerts"}}}
            }
        }))
        .unwrap();
        let rule = &expansion.resources["MyFunctionNightly"];
        assert_eq!(rule["Type"], json!("AWS::Events::Rule"));
        assert_eq!(rule["Properties"]["State"], json!("DISABLED"));
        assert!(expansion.contains("MyFunctionNightlyPermission"));
        assert_eq!(expansion.resources["MyFunctionTopic"]["Type"], json!("AWS::SNS::Subscription"));
    }

    #[test]
    fn test_unknown_event_type() {
        let err = expand_function(json!({
            "CodeUri": "./s",
            "Events": {"Odd": {"Type": "Carrier"}}
        }))
        .unwrap_err();
        assert!(err.message.contains("Event with id [Odd] is invalid"));
    }

    #[test]
    fn test_function_url() {
        let expansion = expand_function(json!({
            "CodeUri": "./s",
            "FunctionUrlConfig": {"AuthType": "NONE"}
        }))
        .unwrap();
        assert!(expansion.contains("MyFunctionUrl"));
        assert!(expansion.contains("MyFunctionURLPublicPermissions"));
    }
}
