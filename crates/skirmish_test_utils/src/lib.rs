//! # Skirmish Test Utilities
//!
//! Shared testing utilities for the skirmish core:
//! - Roster fixtures and tree builders
//! - Host and planner doubles
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod doubles;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
