//! SAM support: recognising serverless templates, expanding them into plain
//! CloudFormation, and mapping expanded logical IDs back to the source.

mod context;
mod detect;
mod error;
mod expander;
mod source_map;
mod transform;

pub use context::TransformContext;
pub use detect::{is_sam_template, SERVERLESS_RESOURCE_TYPES, SERVERLESS_TRANSFORM};
pub use error::{ExpansionError, TransformError};
pub use expander::{MacroExpander, ServerlessExpander};
pub use source_map::{Origin, SourceMap};
pub use transform::{transform, transform_with, Transformed};
