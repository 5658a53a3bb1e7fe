//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the warranty claims test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for test data construction
//! - `mocks`: In-memory adapters for every engine port
//! - `assertions`: Custom assertion helpers for domain types

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

use once_cell::sync::Lazy;

static TRACING: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init()
        .ok();
});

/// Initializes the tracing subscriber once for the whole test binary.
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
