//! # CloudFormation Template Model
//!
//! A typed façade over a parsed template plus the traversal vocabulary rules
//! are written in.
//!
//! [`Template`] decodes the standard sections (`Parameters`, `Mappings`,
//! `Conditions`, `Resources`, `Outputs`) into entities that remember the key
//! they were declared under, so entity-level findings point at the key's
//! line. Property trees are exposed as position-free [`Value`]s and searched
//! with the helpers in [`walk`].

mod entities;
mod pseudo;
mod template;
pub mod walk;

pub use cfn_syntax::{Node, NodeKind, ParseError, ParseErrorKind, Value};
pub use entities::{scalar_text, Condition, Declaration, Mapping, Output, Parameter, Resource, ValueMap};
pub use pseudo::{is_pseudo_parameter, PSEUDO_PARAMETERS};
pub use template::{Template, TOP_LEVEL_SECTIONS};
pub use walk::{
    find_condition_refs, find_getatt, find_intrinsic, find_references, find_refs,
    find_sub_variables, join_path, walk, ConditionRef, GetAttSite, IntrinsicSite, Path,
    Reference, ReferenceKind, RefSite,
};
