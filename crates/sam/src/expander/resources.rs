//! Serverless resource types that expand into one or a few resources.

use serde_json::{json, Value as Json};

use super::api::s3_location;
use super::policies::{execution_role, RoleSpec};
use super::{get_att, reference, tag_list, Expansion, JsonMap, Source};
use crate::error::ExpansionError;

pub(crate) fn expand_simple_table(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let (name, kind) = match source.property("PrimaryKey") {
        None => (json!("id"), "String".to_string()),
        Some(key) => {
            let Some(name) = key.get("Name") else {
                return Err(source.invalid("Property 'PrimaryKey' requires 'Name'."));
            };
            let kind = key.get("Type").and_then(Json::as_str).unwrap_or("String").to_string();
            (name.clone(), kind)
        }
    };
    let attribute_type = match kind.as_str() {
        "String" => "S",
        "Number" => "N",
        "Binary" => "B",
        other => {
            return Err(source.invalid(format!(
                "Property 'PrimaryKey.Type' must be String, Number or Binary, got '{other}'."
            )))
        }
    };

    let mut table = JsonMap::new();
    table.insert(
        "AttributeDefinitions".to_string(),
        json!([{ "AttributeName": name, "AttributeType": attribute_type }]),
    );
    table.insert("KeySchema".to_string(), json!([{ "AttributeName": name, "KeyType": "HASH" }]));
    match source.property("ProvisionedThroughput") {
        Some(throughput) => {
            table.insert("ProvisionedThroughput".to_string(), throughput.clone());
        }
        None => {
            table.insert("BillingMode".to_string(), json!("PAY_PER_REQUEST"));
        }
    }
    source.pass_through(&mut table, &["TableName", "SSESpecification", "PointInTimeRecoverySpecification"]);
    if source.property("Tags").is_some() {
        table.insert("Tags".to_string(), tag_list(source.property("Tags"), None));
    }
    expansion.primary(source, "AWS::DynamoDB::Table", table);
    Ok(())
}

pub(crate) fn expand_layer_version(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let Some(content) = source.property("ContentUri") else {
        return Err(source.invalid("Missing required property 'ContentUri'."));
    };
    let mut layer = JsonMap::new();
    layer.insert("Content".to_string(), s3_location(content, "S3Bucket", "S3Key", "S3ObjectVersion"));
    layer.insert(
        "LayerName".to_string(),
        source.property("LayerName").cloned().unwrap_or_else(|| json!(source.logical_id)),
    );
    source.pass_through(
        &mut layer,
        &["Description", "CompatibleRuntimes", "CompatibleArchitectures", "LicenseInfo"],
    );
    expansion.primary(source, "AWS::Lambda::LayerVersion", layer);

    let retention = source.property("RetentionPolicy").and_then(Json::as_str).map(str::to_ascii_lowercase);
    let policy = match retention.as_deref() {
        None | Some("retain") => "Retain",
        Some("delete") => "Delete",
        Some(_) => return Err(source.invalid("'RetentionPolicy' must be 'Retain' or 'Delete'.")),
    };
    if let Some(resource) = expansion.get_mut(source.logical_id) {
        resource.insert("DeletionPolicy".to_string(), json!(policy));
    }
    Ok(())
}

pub(crate) fn expand_application(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let template_url = match source.property("Location") {
        Some(Json::String(url)) => json!(url),
        Some(Json::Object(location)) => {
            let (Some(application), Some(version)) = (
                location.get("ApplicationId").and_then(Json::as_str),
                location.get("SemanticVersion").and_then(Json::as_str),
            ) else {
                return Err(source.invalid("'Location' requires 'ApplicationId' and 'SemanticVersion'."));
            };
            json!(format!(
                "https://awsserverlessrepo-changesets.s3.amazonaws.com/{}/{version}/template.yaml",
                application.rsplit('/').next().unwrap_or(application)
            ))
        }
        _ => return Err(source.invalid("Missing required property 'Location'.")),
    };

    let mut stack = JsonMap::new();
    stack.insert("TemplateURL".to_string(), template_url);
    source.pass_through(&mut stack, &["Parameters", "NotificationARNs", "TimeoutInMinutes"]);
    stack.insert(
        "Tags".to_string(),
        tag_list(source.property("Tags"), Some(("lambda:createdBy", "SAM"))),
    );
    expansion.primary(source, "AWS::CloudFormation::Stack", stack);
    Ok(())
}

pub(crate) fn expand_state_machine(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let role_id = source.child_id("Role");
    let mut machine = JsonMap::new();
    match (source.property("Definition"), source.property("DefinitionUri")) {
        (Some(_), Some(_)) => {
            return Err(source.invalid("Specify either 'Definition' or 'DefinitionUri', not both."))
        }
        (Some(definition), None) => {
            let text = serde_json::to_string(definition)
                .map_err(|err| source.invalid(format!("'Definition' could not be serialized: {err}")))?;
            machine.insert("DefinitionString".to_string(), json!(text));
        }
        (None, Some(uri)) => {
            machine.insert("DefinitionS3Location".to_string(), s3_location(uri, "Bucket", "Key", "Version"));
        }
        (None, None) => return Err(source.invalid("Either 'Definition' or 'DefinitionUri' must be set.")),
    }
    if let Some(substitutions) = source.property("DefinitionSubstitutions") {
        machine.insert("DefinitionSubstitutions".to_string(), substitutions.clone());
    }
    machine.insert(
        "RoleArn".to_string(),
        source.property("Role").cloned().unwrap_or_else(|| get_att(&role_id, "Arn")),
    );
    if let Some(name) = source.property("Name") {
        machine.insert("StateMachineName".to_string(), name.clone());
    }
    if let Some(kind) = source.property("Type") {
        machine.insert("StateMachineType".to_string(), kind.clone());
    }
    if let Some(logging) = source.property("Logging") {
        machine.insert("LoggingConfiguration".to_string(), logging.clone());
    }
    if let Some(tracing) = source.property("Tracing") {
        machine.insert("TracingConfiguration".to_string(), tracing.clone());
    }
    machine.insert(
        "Tags".to_string(),
        tag_list(source.property("Tags"), Some(("stateMachine:createdBy", "SAM"))),
    );
    expansion.primary(source, "AWS::StepFunctions::StateMachine", machine);

    if source.property("Role").is_none() {
        let spec = RoleSpec {
            service: "states.amazonaws.com",
            managed: Vec::new(),
            created_by_tag: false,
        };
        let role = execution_role(source, &role_id, spec)?;
        expansion.child(source, &role_id, "AWS::IAM::Role", role);
    }

    if let Some(Json::Object(events)) = source.property("Events") {
        for (event_id, event) in events {
            let event_type = event.get("Type").and_then(Json::as_str).unwrap_or_default();
            let properties = event.get("Properties");
            let mut rule = JsonMap::new();
            match event_type {
                "Schedule" => {
                    let Some(schedule) = properties.and_then(|p| p.get("Schedule")) else {
                        return Err(source.invalid(format!(
                            "Event with id [{event_id}] is invalid. Missing required property 'Schedule'."
                        )));
                    };
                    rule.insert("ScheduleExpression".to_string(), schedule.clone());
                }
                "CloudWatchEvent" | "EventBridgeRule" => {
                    let Some(pattern) = properties.and_then(|p| p.get("Pattern")) else {
                        return Err(source.invalid(format!(
                            "Event with id [{event_id}] is invalid. Missing required property 'Pattern'."
                        )));
                    };
                    rule.insert("EventPattern".to_string(), pattern.clone());
                }
                other => {
                    return Err(source.invalid(format!(
                        "Event with id [{event_id}] is invalid. Type '{other}' is not supported for state machines."
                    )))
                }
            }

            let rule_id = source.child_id(event_id);
            let events_role_id = format!("{rule_id}Role");
            rule.insert(
                "Targets".to_string(),
                json!([{
                    "Arn": reference(source.logical_id),
                    "Id": format!("{rule_id}StepFunctionsTarget"),
                    "RoleArn": get_att(&events_role_id, "Arn"),
                }]),
            );
            expansion.child(source, &rule_id, "AWS::Events::Rule", rule);

            let mut events_role = JsonMap::new();
            events_role.insert(
                "AssumeRolePolicyDocument".to_string(),
                json!({
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": ["sts:AssumeRole"],
                        "Effect": "Allow",
                        "Principal": {"Service": ["events.amazonaws.com"]}
                    }]
                }),
            );
            events_role.insert(
                "Policies".to_string(),
                json!([{
                    "PolicyName": format!("{rule_id}RoleStartExecutionPolicy"),
                    "PolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Action": "states:StartExecution",
                            "Effect": "Allow",
                            "Resource": reference(source.logical_id)
                        }]
                    }
                }]),
            );
            expansion.child(source, &events_role_id, "AWS::IAM::Role", events_role);
        }
    }
    Ok(())
}

/// Actions granted by a connector, per destination type and permission.
const CONNECTOR_ACTIONS: &[(&str, &str, &[&str])] = &[
    ("AWS::DynamoDB::Table", "Read", &["dynamodb:GetItem", "dynamodb:Query", "dynamodb:Scan", "dynamodb:BatchGetItem"]),
    ("AWS::DynamoDB::Table", "Write", &["dynamodb:PutItem", "dynamodb:UpdateItem", "dynamodb:DeleteItem", "dynamodb:BatchWriteItem"]),
    ("AWS::S3::Bucket", "Read", &["s3:GetObject", "s3:ListBucket"]),
    ("AWS::S3::Bucket", "Write", &["s3:PutObject", "s3:DeleteObject"]),
    ("AWS::SQS::Queue", "Read", &["sqs:ReceiveMessage", "sqs:GetQueueAttributes"]),
    ("AWS::SQS::Queue", "Write", &["sqs:SendMessage", "sqs:DeleteMessage"]),
    ("AWS::SNS::Topic", "Write", &["sns:Publish"]),
    ("AWS::Lambda::Function", "Write", &["lambda:InvokeFunction"]),
    ("AWS::Serverless::Function", "Write", &["lambda:InvokeFunction"]),
    ("AWS::Events::EventBus", "Write", &["events:PutEvents"]),
    ("AWS::StepFunctions::StateMachine", "Write", &["states:StartExecution"]),
    ("AWS::Serverless::StateMachine", "Write", &["states:StartExecution"]),
];

pub(crate) fn expand_connector(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let source_id = source
        .property("Source")
        .and_then(|s| s.get("Id"))
        .and_then(Json::as_str)
        .ok_or_else(|| source.invalid("Missing required property 'Source.Id'."))?;
    let destination = source
        .property("Destination")
        .ok_or_else(|| source.invalid("Missing required property 'Destination'."))?;
    let destination_id = destination
        .get("Id")
        .and_then(Json::as_str)
        .ok_or_else(|| source.invalid("Missing required property 'Destination.Id'."))?;
    let destination_type = destination.get("Type").and_then(Json::as_str).unwrap_or_default();
    let Some(Json::Array(permissions)) = source.property("Permissions") else {
        return Err(source.invalid("Missing required property 'Permissions'."));
    };

    let mut actions: Vec<&str> = Vec::new();
    for permission in permissions {
        let permission = permission.as_str().unwrap_or_default();
        let Some((_, _, granted)) = CONNECTOR_ACTIONS
            .iter()
            .find(|(kind, name, _)| *kind == destination_type && *name == permission)
        else {
            return Err(source.invalid(format!(
                "Unable to create connector from {source_id} to {destination_id}; \
                 '{permission}' is not supported for '{destination_type}'."
            )));
        };
        actions.extend(granted.iter().copied());
    }

    let resource = match destination_type {
        "AWS::S3::Bucket" => json!([
            get_att(destination_id, "Arn"),
            { "Fn::Sub": ["${DestinationArn}/*", { "DestinationArn": get_att(destination_id, "Arn") }] }
        ]),
        "AWS::SQS::Queue" | "AWS::Events::EventBus" | "AWS::DynamoDB::Table" | "AWS::Lambda::Function"
        | "AWS::Serverless::Function" => json!([get_att(destination_id, "Arn")]),
        _ => json!([reference(destination_id)]),
    };

    let mut policy = JsonMap::new();
    policy.insert(
        "PolicyDocument".to_string(),
        json!({
            "Version": "2012-10-17",
            "Statement": [{ "Effect": "Allow", "Action": actions, "Resource": resource }]
        }),
    );
    policy.insert("Roles".to_string(), json!([reference(&format!("{source_id}Role"))]));
    expansion.primary_as(source, &source.child_id("Policy"), "AWS::IAM::ManagedPolicy", policy);
    Ok(())
}

pub(crate) fn expand_graphql_api(source: &Source<'_>, expansion: &mut Expansion) -> Result<(), ExpansionError> {
    let Some(auth_type) = source
        .property("Auth")
        .and_then(|auth| auth.get("Type"))
        .cloned()
    else {
        return Err(source.invalid("Missing required property 'Auth.Type'."));
    };

    let mut api = JsonMap::new();
    api.insert(
        "Name".to_string(),
        source.property("Name").cloned().unwrap_or_else(|| json!(source.logical_id)),
    );
    api.insert("AuthenticationType".to_string(), auth_type);
    source.pass_through(&mut api, &["XrayEnabled", "Visibility", "IntrospectionConfig"]);
    if source.property("Tags").is_some() {
        api.insert("Tags".to_string(), tag_list(source.property("Tags"), None));
    }
    expansion.primary(source, "AWS::AppSync::GraphQLApi", api);

    let mut schema = JsonMap::new();
    schema.insert("ApiId".to_string(), get_att(source.logical_id, "ApiId"));
    match (source.property("SchemaInline"), source.property("SchemaUri")) {
        (Some(inline), _) => {
            schema.insert("Definition".to_string(), inline.clone());
        }
        (None, Some(uri)) => {
            schema.insert("DefinitionS3Location".to_string(), uri.clone());
        }
        (None, None) => return Err(source.invalid("Either 'SchemaInline' or 'SchemaUri' must be set.")),
    }
    expansion.child(source, &source.child_id("Schema"), "AWS::AppSync::GraphQLSchema", schema);

    if let Some(Json::Object(keys)) = source.property("ApiKeys") {
        for (key_name, key) in keys {
            let mut api_key = JsonMap::new();
            api_key.insert("ApiId".to_string(), get_att(source.logical_id, "ApiId"));
            for property in ["Description", "ExpiresOn"] {
                if let Some(value) = key.get(property) {
                    api_key.insert(property.to_string(), value.clone());
                }
            }
            expansion.child(source, &source.child_id(key_name), "AWS::AppSync::ApiKey", api_key);
        }
    }
    Ok(())
}
