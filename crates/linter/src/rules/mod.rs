//! Built-in rule catalog.
//!
//! Rules live one per file, except where a few share a check. Most reduce
//! to a traversal with the helpers in `cfn_template::walk`; the shared
//! pieces are here.
use crate::traits::LintRule;
use cfn_template::walk::{find_condition_refs, find_intrinsic, find_references};
use cfn_template::{is_pseudo_parameter, Node, Template, Value};
use cfn_types::Finding;
use std::collections::HashSet;
use std::sync::Arc;

mod and_or_arity;
mod conditional_refs;
mod condition_refs;
mod deletion_policy;
mod depends_on;
mod equals_arity;
mod find_in_map;
mod getatt_target;
mod join_arity;
mod limits;
mod logical_id;
mod no_echo_output;
mod not_arity;
mod output_structure;
mod output_value;
mod parameter_pattern;
mod parameter_structure;
mod parameter_type;
mod ref_target;
mod resource_structure;
mod sub_variables;
mod sub_without_variables;
mod template_structure;
mod unused_condition;
mod unused_mapping;
mod unused_parameter;

pub use and_or_arity::AndOrArityRuleImpl;
pub use conditional_refs::ConditionalRefsRuleImpl;
pub use condition_refs::ConditionRefsRuleImpl;
pub use deletion_policy::{DeletionPolicyRuleImpl, UpdateReplacePolicyRuleImpl};
pub use depends_on::DependsOnRuleImpl;
pub use equals_arity::EqualsArityRuleImpl;
pub use find_in_map::FindInMapRuleImpl;
pub use getatt_target::GetAttTargetRuleImpl;
pub use join_arity::JoinArityRuleImpl;
pub use limits::{
    MappingLimitRuleImpl, OutputLimitRuleImpl, ParameterLimitRuleImpl, ResourceLimitApproachingRuleImpl,
    ResourceLimitRuleImpl,
};
pub use logical_id::LogicalIdRuleImpl;
pub use no_echo_output::NoEchoOutputRuleImpl;
pub use not_arity::NotArityRuleImpl;
pub use output_structure::OutputStructureRuleImpl;
pub use output_value::OutputValueRuleImpl;
pub use parameter_pattern::ParameterPatternRuleImpl;
pub use parameter_structure::ParameterStructureRuleImpl;
pub use parameter_type::ParameterTypeRuleImpl;
pub use ref_target::RefTargetRuleImpl;
pub use resource_structure::ResourceStructureRuleImpl;
pub use sub_variables::SubVariablesRuleImpl;
pub use sub_without_variables::SubWithoutVariablesRuleImpl;
pub use template_structure::TemplateStructureRuleImpl;
pub use unused_condition::UnusedConditionRuleImpl;
pub use unused_mapping::UnusedMappingRuleImpl;
pub use unused_parameter::UnusedParameterRuleImpl;

/// Every built-in rule, in id order.
pub(crate) fn builtin_rules() -> Vec<Arc<dyn LintRule>> {
    vec![
        Arc::new(TemplateStructureRuleImpl),
        Arc::new(GetAttTargetRuleImpl),
        Arc::new(FindInMapRuleImpl),
        Arc::new(RefTargetRuleImpl),
        Arc::new(SubVariablesRuleImpl),
        Arc::new(JoinArityRuleImpl),
        Arc::new(ParameterStructureRuleImpl),
        Arc::new(ParameterTypeRuleImpl),
        Arc::new(ParameterPatternRuleImpl),
        Arc::new(ParameterLimitRuleImpl),
        Arc::new(ResourceStructureRuleImpl),
        Arc::new(DependsOnRuleImpl),
        Arc::new(LogicalIdRuleImpl),
        Arc::new(ResourceLimitRuleImpl),
        Arc::new(DeletionPolicyRuleImpl),
        Arc::new(UpdateReplacePolicyRuleImpl),
        Arc::new(OutputStructureRuleImpl),
        Arc::new(OutputValueRuleImpl),
        Arc::new(OutputLimitRuleImpl),
        Arc::new(MappingLimitRuleImpl),
        Arc::new(ConditionRefsRuleImpl),
        Arc::new(EqualsArityRuleImpl),
        Arc::new(AndOrArityRuleImpl),
        Arc::new(NotArityRuleImpl),
        Arc::new(ConditionalRefsRuleImpl),
        Arc::new(SubWithoutVariablesRuleImpl),
        Arc::new(UnusedParameterRuleImpl),
        Arc::new(NoEchoOutputRuleImpl),
        Arc::new(UnusedMappingRuleImpl),
        Arc::new(UnusedConditionRuleImpl),
        Arc::new(ResourceLimitApproachingRuleImpl),
    ]
}

/// Build a finding positioned at `path` in `template`.
pub(crate) fn report(
    template: &Template,
    rule_id: &str,
    message: impl Into<String>,
    path: Vec<String>,
) -> Finding {
    let location = template.location_of(&path);
    Finding::new(rule_id, message, path, location)
}

/// `[section, name]`
pub(crate) fn entity_path(section: &str, name: &str) -> Vec<String> {
    vec![section.to_string(), name.to_string()]
}

/// A value to traverse and the path it lives at.
pub(crate) struct Scope {
    pub prefix: Vec<String>,
    pub value: Value,
}

impl Scope {
    /// Prefix joined with a path relative to the scope's value
    pub fn path(&self, rest: &[String]) -> Vec<String> {
        self.prefix.iter().chain(rest).cloned().collect()
    }
}

/// Every place intrinsic functions may appear: condition expressions,
/// resource bodies (without `Metadata`) and output bodies.
pub(crate) fn expression_scopes(template: &Template) -> Vec<Scope> {
    let mut scopes = Vec::new();
    for (name, condition) in template.conditions() {
        scopes.push(Scope {
            prefix: entity_path("Conditions", name),
            value: condition.expression.clone(),
        });
    }
    for (name, resource) in template.resources() {
        let mut value = resource.declaration.node.to_value();
        if let Value::Mapping(body) = &mut value {
            body.shift_remove("Metadata");
        }
        scopes.push(Scope {
            prefix: entity_path("Resources", name),
            value,
        });
    }
    for (name, output) in template.outputs() {
        scopes.push(Scope {
            prefix: entity_path("Outputs", name),
            value: output.declaration.node.to_value(),
        });
    }
    scopes
}

/// A condition name used somewhere in the template.
pub(crate) struct ConditionUse {
    pub name: String,
    pub path: Vec<String>,
}

/// Every condition reference: `Condition` attributes of resources and
/// outputs, `Condition` intrinsics inside condition expressions, and the
/// first operand of each `Fn::If`.
pub(crate) fn condition_uses(template: &Template) -> Vec<ConditionUse> {
    let mut uses = Vec::new();
    let attributes = template
        .resources()
        .map(|(name, resource)| ("Resources", name, resource.declaration.node.get("Condition")))
        .chain(
            template
                .outputs()
                .map(|(name, output)| ("Outputs", name, output.declaration.node.get("Condition"))),
        );
    for (section, name, node) in attributes {
        if let Some(condition) = node.and_then(Node::as_str) {
            let mut path = entity_path(section, name);
            path.push("Condition".to_string());
            uses.push(ConditionUse {
                name: condition.to_string(),
                path,
            });
        }
    }

    for scope in expression_scopes(template) {
        if scope.prefix.first().is_some_and(|section| section == "Conditions") {
            for site in find_condition_refs(&scope.value) {
                uses.push(ConditionUse {
                    name: site.name.to_string(),
                    path: scope.path(&site.path),
                });
            }
            continue;
        }
        for site in find_intrinsic(&scope.value, "Fn::If") {
            let name = site.operand.as_sequence().and_then(<[Value]>::first).and_then(Value::as_str);
            if let Some(name) = name {
                uses.push(ConditionUse {
                    name: name.to_string(),
                    path: scope.path(&site.path),
                });
            }
        }
    }
    uses
}

/// Names referenced through `Ref`, `Fn::GetAtt` or `Fn::Sub` anywhere
/// outside the `Parameters` section.
pub(crate) fn referenced_names(template: &Template) -> HashSet<String> {
    let mut names = HashSet::new();
    for section in template.top_level_keys().filter(|key| *key != "Parameters") {
        let Some(node) = template.section_node(section) else {
            continue;
        };
        let value = node.to_value();
        names.extend(find_references(&value).into_iter().map(|reference| reference.name.to_string()));
    }
    names
}

/// Whether `Ref` may target `name`.
pub(crate) fn is_ref_target(template: &Template, name: &str) -> bool {
    template.has_parameter(name) || template.has_resource(name) || is_pseudo_parameter(name)
}

/// Number of elements of a list operand, `None` for non-lists.
pub(crate) fn list_len(operand: &Value) -> Option<usize> {
    operand.as_sequence().map(<[Value]>::len)
}

/// Closest candidate for a "did you mean" hint.
pub(crate) fn closest<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .map(|candidate| (candidate, strsim::levenshtein(&name.to_lowercase(), &candidate.to_lowercase())))
        .filter(|(candidate, distance)| *distance <= (candidate.len() / 3).max(1))
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}
