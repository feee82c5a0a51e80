//! `DeletionPolicy` and `UpdateReplacePolicy` values.
use super::{entity_path, report};
use crate::traits::LintRule;
use cfn_template::{Node, NodeKind, Resource, Template};
use cfn_types::Finding;

const DELETION_POLICIES: &[&str] = &["Delete", "Retain", "RetainExceptOnCreate", "Snapshot"];
const UPDATE_REPLACE_POLICIES: &[&str] = &["Delete", "Retain", "Snapshot"];

/// Shared check: the attribute, when present and not an intrinsic, must be
/// one of `allowed`.
fn check_policy(
    template: &Template,
    rule_id: &str,
    attribute: &str,
    allowed: &[&str],
    policy: impl Fn(&Resource) -> Option<&Node>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (name, resource) in template.resources() {
        let Some(node) = policy(resource) else {
            continue;
        };
        if node.to_value().as_intrinsic().is_some() {
            continue;
        }
        let valid = node.kind() == NodeKind::Scalar && node.as_str().is_some_and(|value| allowed.contains(&value));
        if valid {
            continue;
        }
        let mut path = entity_path("Resources", name);
        path.push(attribute.to_string());
        let shown = node.raw_value().unwrap_or("a non-string value");
        findings.push(report(
            template,
            rule_id,
            format!("{attribute} of resource {name} is {shown}, expected one of {}", allowed.join(", ")),
            path,
        ));
    }
    findings
}

/// Lint rule that checks `DeletionPolicy` values.
pub struct DeletionPolicyRuleImpl;

impl LintRule for DeletionPolicyRuleImpl {
    fn id(&self) -> &'static str {
        "E3035"
    }

    fn short_description(&self) -> &'static str {
        "Check DeletionPolicy values for Resources"
    }

    fn description(&self) -> &'static str {
        "Check that the DeletionPolicy values are valid"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-attribute-deletionpolicy.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "deletionpolicy"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        check_policy(template, self.id(), "DeletionPolicy", DELETION_POLICIES, Resource::deletion_policy)
    }
}

/// Lint rule that checks `UpdateReplacePolicy` values.
pub struct UpdateReplacePolicyRuleImpl;

impl LintRule for UpdateReplacePolicyRuleImpl {
    fn id(&self) -> &'static str {
        "E3036"
    }

    fn short_description(&self) -> &'static str {
        "Check UpdateReplacePolicy values for Resources"
    }

    fn description(&self) -> &'static str {
        "Check that the UpdateReplacePolicy values are valid"
    }

    fn source_url(&self) -> &'static str {
        "https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/aws-attribute-updatereplacepolicy.html"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["resources", "updatereplacepolicy"]
    }

    fn evaluate(&self, template: &Template) -> Vec<Finding> {
        check_policy(
            template,
            self.id(),
            "UpdateReplacePolicy",
            UPDATE_REPLACE_POLICIES,
            Resource::update_replace_policy,
        )
    }
}
