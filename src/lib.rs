//! EV Warranty Core
//!
//! Facade crate re-exporting the workspace members. Most consumers depend on
//! the domain crates directly; this root exists so the end-to-end lifecycle
//! tests have a single anchor package.

pub use core_kernel;
pub use domain_claims;
pub use domain_vehicle;
