//! Execution roles and the `Policies` property.

use serde_json::{json, Value as Json};

use super::{tag_list, JsonMap, Source};
use crate::error::ExpansionError;

/// A SAM policy template: a named, parameterised inline statement.
struct PolicyTemplate {
    name: &'static str,
    /// Template parameter and the `Fn::Sub` variable it binds
    parameter: Option<(&'static str, &'static str)>,
    actions: &'static [&'static str],
    resources: &'static [&'static str],
}

static POLICY_TEMPLATES: &[PolicyTemplate] = &[
    PolicyTemplate {
        name: "S3ReadPolicy",
        parameter: Some(("BucketName", "bucketName")),
        actions: &["s3:GetObject", "s3:ListBucket", "s3:GetBucketLocation", "s3:GetObjectVersion"],
        resources: &["arn:${AWS::Partition}:s3:::${bucketName}", "arn:${AWS::Partition}:s3:::${bucketName}/*"],
    },
    PolicyTemplate {
        name: "S3CrudPolicy",
        parameter: Some(("BucketName", "bucketName")),
        actions: &[
            "s3:GetObject",
            "s3:ListBucket",
            "s3:GetBucketLocation",
            "s3:GetObjectVersion",
            "s3:PutObject",
            "s3:PutObjectAcl",
            "s3:DeleteObject",
        ],
        resources: &["arn:${AWS::Partition}:s3:::${bucketName}", "arn:${AWS::Partition}:s3:::${bucketName}/*"],
    },
    PolicyTemplate {
        name: "DynamoDBReadPolicy",
        parameter: Some(("TableName", "tableName")),
        actions: &[
            "dynamodb:GetItem",
            "dynamodb:Scan",
            "dynamodb:Query",
            "dynamodb:BatchGetItem",
            "dynamodb:DescribeTable",
        ],
        resources: &[
            "arn:${AWS::Partition}:dynamodb:${AWS::Region}:${AWS::AccountId}:table/${tableName}",
            "arn:${AWS::Partition}:dynamodb:${AWS::Region}:${AWS::AccountId}:table/${tableName}/index/*",
        ],
    },
    PolicyTemplate {
        name: "DynamoDBCrudPolicy",
        parameter: Some(("TableName", "tableName")),
        actions: &[
            "dynamodb:GetItem",
            "dynamodb:DeleteItem",
            "dynamodb:PutItem",
            "dynamodb:Scan",
            "dynamodb:Query",
            "dynamodb:UpdateItem",
            "dynamodb:BatchWriteItem",
            "dynamodb:BatchGetItem",
            "dynamodb:DescribeTable",
            "dynamodb:ConditionCheckItem",
        ],
        resources: &[
            "arn:${AWS::Partition}:dynamodb:${AWS::Region}:${AWS::AccountId}:table/${tableName}",
            "arn:${AWS::Partition}:dynamodb:${AWS::Region}:${AWS::AccountId}:table/${tableName}/index/*",
        ],
    },
    PolicyTemplate {
        name: "SQSSendMessagePolicy",
        parameter: Some(("QueueName", "queueName")),
        actions: &["sqs:SendMessage*"],
        resources: &["arn:${AWS::Partition}:sqs:${AWS::Region}:${AWS::AccountId}:${queueName}"],
    },
    PolicyTemplate {
        name: "SNSPublishMessagePolicy",
        parameter: Some(("TopicName", "topicName")),
        actions: &["sns:Publish"],
        resources: &["arn:${AWS::Partition}:sns:${AWS::Region}:${AWS::AccountId}:${topicName}"],
    },
    PolicyTemplate {
        name: "LambdaInvokePolicy",
        parameter: Some(("FunctionName", "functionName")),
        actions: &["lambda:InvokeFunction"],
        resources: &["arn:${AWS::Partition}:lambda:${AWS::Region}:${AWS::AccountId}:function:${functionName}*"],
    },
    PolicyTemplate {
        name: "AWSSecretsManagerGetSecretValuePolicy",
        parameter: Some(("SecretArn", "secretArn")),
        actions: &["secretsmanager:GetSecretValue"],
        resources: &["${secretArn}"],
    },
    PolicyTemplate {
        name: "CloudWatchPutMetricPolicy",
        parameter: None,
        actions: &["cloudwatch:PutMetricData"],
        resources: &["*"],
    },
];

/// Inputs for an IAM role generated on behalf of a serverless resource.
pub(crate) struct RoleSpec<'a> {
    pub service: &'a str,
    pub managed: Vec<Json>,
    pub created_by_tag: bool,
}

/// Properties of the execution role for `source`, including its `Policies`.
pub(crate) fn execution_role(source: &Source<'_>, role_id: &str, spec: RoleSpec<'_>) -> Result<JsonMap, ExpansionError> {
    let mut managed = spec.managed;
    let mut inline = Vec::new();

    let policies = match source.property("Policies") {
        None => Vec::new(),
        Some(Json::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    };

    for policy in policies {
        match policy {
            Json::String(name) => managed.push(managed_policy_arn(&name)),
            Json::Object(ref map) if is_intrinsic(map) => managed.push(policy.clone()),
            Json::Object(map) if map.contains_key("Statement") => {
                inline.push(json!({
                    "PolicyName": format!("{role_id}Policy{}", inline.len()),
                    "PolicyDocument": Json::Object(map),
                }));
            }
            Json::Object(map) if map.len() == 1 => {
                let Some((name, arguments)) = map.iter().next() else {
                    continue;
                };
                let statement = expand_policy_template(source, name, arguments)?;
                inline.push(json!({
                    "PolicyName": format!("{role_id}Policy{}", inline.len()),
                    "PolicyDocument": {"Version": "2012-10-17", "Statement": [statement]},
                }));
            }
            other => {
                return Err(source.invalid(format!(
                    "Property 'Policies' has an invalid entry: {other}."
                )))
            }
        }
    }

    let mut properties = JsonMap::new();
    properties.insert(
        "AssumeRolePolicyDocument".to_string(),
        json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Action": ["sts:AssumeRole"],
                "Effect": "Allow",
                "Principal": {"Service": [spec.service]}
            }]
        }),
    );
    properties.insert("ManagedPolicyArns".to_string(), Json::Array(managed));
    if !inline.is_empty() {
        properties.insert("Policies".to_string(), Json::Array(inline));
    }
    source.pass_through(&mut properties, &["PermissionsBoundary"]);
    if spec.created_by_tag {
        properties.insert(
            "Tags".to_string(),
            tag_list(source.property("Tags"), Some(("lambda:createdBy", "SAM"))),
        );
    }
    Ok(properties)
}

/// A managed policy given by name or ARN.
pub(crate) fn managed_policy_arn(name: &str) -> Json {
    if name.starts_with("arn:") {
        Json::String(name.to_string())
    } else {
        json!({ "Fn::Sub": format!("arn:${{AWS::Partition}}:iam::aws:policy/{name}") })
    }
}

fn is_intrinsic(map: &JsonMap) -> bool {
    map.len() == 1 && map.keys().all(|key| key == "Ref" || key.starts_with("Fn::"))
}

fn expand_policy_template(source: &Source<'_>, name: &str, arguments: &Json) -> Result<Json, ExpansionError> {
    let Some(template) = POLICY_TEMPLATES.iter().find(|t| t.name == name) else {
        return Err(source.invalid(format!("Policy template '{name}' is not supported.")));
    };

    let resources: Vec<Json> = match template.parameter {
        None => template.resources.iter().map(|r| Json::String((*r).to_string())).collect(),
        Some((parameter, variable)) => {
            let Some(value) = arguments.get(parameter) else {
                return Err(source.invalid(format!(
                    "Missing parameter '{parameter}' for policy template '{name}'."
                )));
            };
            template
                .resources
                .iter()
                .map(|pattern| json!({ "Fn::Sub": [pattern, { variable: value }] }))
                .collect()
        }
    };

    Ok(json!({
        "Effect": "Allow",
        "Action": template.actions,
        "Resource": resources,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::ResourceAttributes;

    fn source(properties: Json) -> Source<'static> {
        Source {
            logical_id: "Fn",
            attributes: ResourceAttributes::default(),
            properties: properties.as_object().cloned().unwrap(),
        }
    }

    fn role(properties: Json) -> Result<JsonMap, ExpansionError> {
        let spec = RoleSpec {
            service: "lambda.amazonaws.com",
            managed: vec![managed_policy_arn("service-role/AWSLambdaBasicExecutionRole")],
            created_by_tag: true,
        };
        execution_role(&source(properties), "FnRole", spec)
    }

    #[test]
    fn test_default_role() {
        let role = role(json!({})).unwrap();
        assert_eq!(
            role["ManagedPolicyArns"],
            json!([{"Fn::Sub": "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"}])
        );
        assert_eq!(
            role["AssumeRolePolicyDocument"]["Statement"][0]["Principal"],
            json!({"Service": ["lambda.amazonaws.com"]})
        );
        assert_eq!(role["Tags"], json!([{"Key": "lambda:createdBy", "Value": "SAM"}]));
        assert!(role.get("Policies").is_none());
    }

    #[test]
    fn test_policy_forms() {
        let role = role(json!({
            "Policies": [
                "AmazonS3ReadOnlyAccess",
                "arn:aws:iam::aws:policy/AWSXrayWriteOnlyAccess",
                {"Statement": [{"Effect": "Allow", "Action": "s3:*", "Resource": "*"}]},
                {"DynamoDBReadPolicy": {"TableName": {"Ref": "Table"}}}
            ]
        }))
        .unwrap();

        let managed = role["ManagedPolicyArns"].as_array().unwrap();
        assert_eq!(managed.len(), 3);
        assert_eq!(managed[2], json!("arn:aws:iam::aws:policy/AWSXrayWriteOnlyAccess"));

        let inline = role["Policies"].as_array().unwrap();
        assert_eq!(inline[0]["PolicyName"], json!("FnRolePolicy0"));
        assert_eq!(inline[1]["PolicyName"], json!("FnRolePolicy1"));
        let statement = &inline[1]["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Action"][0], json!("dynamodb:GetItem"));
        assert_eq!(statement["Resource"][0]["Fn::Sub"][1], json!({"tableName": {"Ref": "Table"}}));
    }

    #[test]
    fn test_single_policy_string() {
        let role = role(json!({"Policies": "AWSLambdaExecute"})).unwrap();
        assert_eq!(role["ManagedPolicyArns"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_unknown_policy_template() {
        let err = role(json!({"Policies": [{"MadeUpPolicy": {}}]})).unwrap_err();
        assert_eq!(err.logical_id.as_deref(), Some("Fn"));
        assert!(err.message.contains("'MadeUpPolicy' is not supported"));
    }

    #[test]
    fn test_missing_template_parameter() {
        let err = role(json!({"Policies": [{"S3ReadPolicy": {}}]})).unwrap_err();
        assert!(err.message.contains("Missing parameter 'BucketName'"));
    }
}
