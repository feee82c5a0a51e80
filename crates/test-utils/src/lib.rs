//! Shared test utilities for the CloudFormation analyzer crates.
//!
//! - [`fixtures`]: template literals shared by several test suites
//! - [`assertions`]: stable text forms of findings for snapshots
//! - [`init_tracing`]: opt-in log output while debugging a test

pub mod assertions;
pub mod fixtures;

pub use assertions::{format_findings, format_messages};

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG`.
///
/// Logging is off unless `RUST_LOG` is set. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}
