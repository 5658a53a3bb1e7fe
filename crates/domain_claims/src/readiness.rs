//! Submission-readiness check
//!
//! A claim may only go to the EVM once the intake record is complete. The
//! check returns every missing requirement at once so the caller can fix
//! them in one pass.

use serde::{Deserialize, Serialize};

use domain_vehicle::{Customer, Vehicle, Vin};

use crate::claim::Claim;

/// Minimum length of the reported-failure description
pub const MIN_FAILURE_DESCRIPTION_LEN: usize = 10;

/// A requirement the claim does not yet meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingRequirement {
    ValidVin,
    CustomerContact,
    FailureDescription,
    DiagnosisOrAttachment,
}

/// Runs the readiness check; empty result means the claim may be submitted.
pub fn check_readiness(
    claim: &Claim,
    vehicle: Option<&Vehicle>,
    customer: Option<&Customer>,
) -> Vec<MissingRequirement> {
    let mut missing = Vec::new();

    let vin_ok = vehicle
        .map(|v| Vin::new(v.vin.as_str()).is_ok())
        .unwrap_or(false);
    if !vin_ok {
        missing.push(MissingRequirement::ValidVin);
    }

    if !customer.map(Customer::has_contact).unwrap_or(false) {
        missing.push(MissingRequirement::CustomerContact);
    }

    if claim.reported_failure.trim().chars().count() < MIN_FAILURE_DESCRIPTION_LEN {
        missing.push(MissingRequirement::FailureDescription);
    }

    let has_diagnosis = claim
        .initial_diagnosis
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_diagnosis && claim.attachments.is_empty() {
        missing.push(MissingRequirement::DiagnosisOrAttachment);
    }

    missing
}
