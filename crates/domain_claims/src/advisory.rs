//! Advisory side effects
//!
//! Non-essential side effects (notifications, service-history archival,
//! eligibility refresh, optional serial assignment) run after the primary
//! state change commits. Each is independently fault-isolated: a failure is
//! recorded and logged, never propagated.

use serde::{Deserialize, Serialize};
use tracing::warn;

use core_kernel::PortError;

/// Outcome of one advisory effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryOutcome {
    /// What was attempted, e.g. `"notify_customer"`
    pub effect: String,
    pub succeeded: bool,
    /// Failure detail when `succeeded` is false
    pub detail: Option<String>,
}

impl AdvisoryOutcome {
    /// Records the result of an advisory effect, logging failures.
    pub fn record<T>(effect: &str, result: Result<T, PortError>) -> Self {
        match result {
            Ok(_) => Self {
                effect: effect.to_string(),
                succeeded: true,
                detail: None,
            },
            Err(e) => {
                warn!(effect, error = %e, "advisory effect failed");
                Self {
                    effect: effect.to_string(),
                    succeeded: false,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}
