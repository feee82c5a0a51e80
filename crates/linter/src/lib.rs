//! # CloudFormation Linter
//!
//! A rule engine over [`cfn_template::Template`]. Rules implement
//! [`LintRule`] and are collected in a [`RuleRegistry`]; a [`Linter`] runs
//! the registered rules that pass its [`RuleFilters`], isolates rule
//! failures, remaps positions through a SAM [`cfn_sam::SourceMap`] and
//! returns findings in a deterministic order.
//!
//! ```rust,ignore
//! use cfn_linter::prelude::*;
//!
//! let template = cfn_template::Template::from_source(source, "template.yaml")?;
//! let findings = Linter::new(RuleFilters::new().exclude_id("W2001")).lint(&template);
//! ```

mod config;
mod error;
mod filters;
mod linter;
mod mapper;
mod registry;
pub mod rules;
mod traits;

pub use config::LintConfig;
pub use error::{ConfigError, RegistrationError};
pub use filters::RuleFilters;
pub use linter::{run, Linter};
pub use mapper::map_positions;
pub use registry::{all_rule_ids, builtin_registry, RuleRegistry};
pub use traits::LintRule;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types for working with
/// the linter. Import with:
///
/// ```rust,ignore
/// use cfn_linter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::LintConfig;
    pub use crate::filters::RuleFilters;
    pub use crate::linter::Linter;
    pub use crate::registry::{builtin_registry, RuleRegistry};
    pub use crate::traits::LintRule;
    pub use cfn_types::{Finding, Severity};
}
