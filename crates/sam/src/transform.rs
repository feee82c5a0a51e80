//! Expanding a SAM template into plain CloudFormation.

use cfn_template::Template;

use crate::context::TransformContext;
use crate::error::TransformError;
use crate::expander::{MacroExpander, ServerlessExpander};
use crate::source_map::SourceMap;

/// An expanded template plus the map back to the original source.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub template: Template,
    pub source_map: SourceMap,
}

/// Expand `template` with the built-in serverless expander.
pub fn transform(template: &Template, context: &TransformContext) -> Result<Transformed, TransformError> {
    transform_with(template, context, &ServerlessExpander)
}

/// Expand `template` with `expander`.
///
/// The template is re-serialised to JSON, expanded, and read back with the
/// regular reader. Expansion errors naming a resource are positioned at that
/// resource's declaration.
#[tracing::instrument(skip_all, fields(file = %template.source_filename, expander = expander.name()))]
pub fn transform_with(
    template: &Template,
    context: &TransformContext,
    expander: &dyn MacroExpander,
) -> Result<Transformed, TransformError> {
    let bytes = serde_json::to_vec_pretty(&template.to_json())?;

    let output = expander.expand(&bytes, context).map_err(|err| {
        let location = err
            .logical_id
            .as_deref()
            .and_then(|id| template.get_resource(id))
            .map(cfn_template::Resource::location);
        tracing::debug!(error = %err.message, "expansion failed");
        TransformError::Expansion {
            message: err.message,
            location,
        }
    })?;

    let expanded =
        Template::from_bytes(&output, &template.source_filename).map_err(|source| TransformError::Reparse {
            source,
            location: template.location_of(&["Transform"]),
        })?;
    let source_map = SourceMap::build(template, &expanded);
    tracing::debug!(
        resources = expanded.resources().count(),
        mapped = source_map.len(),
        "transformed template"
    );
    Ok(Transformed {
        template: expanded,
        source_map,
    })
}
