//! Foundation types for the CloudFormation analyzer.
//!
//! This crate provides shared types used across the analyzer stack.
//! Its only dependency is `serde`, so it is suitable as a foundation layer.
//!
//! # Type Categories
//!
//! - **Position types**: [`Location`], [`Span`]
//! - **Severity types**: [`Severity`]
//! - **Finding types**: [`Finding`], [`path`]

mod finding;
mod position;
mod severity;

pub use finding::{path, Finding, RUNNER_ERROR};
pub use position::{Location, Span};
pub use severity::Severity;
