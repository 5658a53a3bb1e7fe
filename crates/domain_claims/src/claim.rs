//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ClaimId, CustomerId, Money, UserId, VehicleId};

use crate::error::ClaimError;
use crate::history::AuditTrail;
use crate::item::ClaimItem;
use crate::status::ClaimStatus;

/// Human-readable claim number: `CLM-<year>-<6 digits>`
///
/// The per-year sequence is issued by the claim store, which owns the
/// uniqueness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimNumber(String);

impl ClaimNumber {
    pub fn new(year: i32, sequence: u32) -> Self {
        Self(format!("CLM-{year}-{sequence:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which intake flow created the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeFlow {
    /// Saved as a draft for later completion
    Draft,
    /// Registered directly at the service desk
    Intake,
}

/// Who performs the repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairType {
    /// Service center repairs and bills the customer
    ScRepair,
    /// Manufacturer-covered repair
    EvmRepair,
}

/// Customer payment state for SC-repair claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerPaymentStatus {
    NotRequired,
    Pending,
    Paid,
}

/// Category of a problem reported during repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    PartMismatch,
    AdditionalDamageFound,
    DiagnosisRevised,
    PartDefective,
    Other,
}

/// Maximum problem reports per claim
pub const MAX_PROBLEM_REPORTS: usize = 5;

/// Maximum resubmissions after an EVM rejection
pub const MAX_RESUBMISSIONS: u32 = 1;

/// The warranty claim aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Human-readable claim number
    pub claim_number: ClaimNumber,
    /// Current lifecycle status
    pub status: ClaimStatus,
    /// Repair type; unset until diagnosis decides it
    pub repair_type: Option<RepairType>,
    /// Soft-delete flag for drafts
    pub is_active: bool,

    // Financial
    pub warranty_cost: Option<Money>,
    pub company_paid_cost: Option<Money>,
    pub customer_payment_status: CustomerPaymentStatus,

    // Diagnostic
    pub reported_failure: String,
    pub initial_diagnosis: Option<String>,
    pub diagnostic_details: Option<String>,
    pub is_warranty_eligible: Option<bool>,
    pub manual_warranty_override: Option<bool>,
    pub manual_override_confirmed: bool,
    pub manual_override_confirmed_at: Option<DateTime<Utc>>,
    pub manual_override_confirmed_by: Option<UserId>,
    /// Coverage applied by the eligibility evaluator (best-effort refresh)
    pub applied_warranty_years: Option<u32>,
    pub applied_warranty_km: Option<u32>,

    // Problem escalation
    pub problem_type: Option<ProblemType>,
    pub problem_description: Option<String>,

    // Rejection / resubmission
    pub rejection_reason: Option<String>,
    pub rejection_notes: Option<String>,
    pub rejection_count: u32,
    pub can_resubmit: bool,
    pub resubmit_count: u32,

    // Relations
    pub vehicle_id: VehicleId,
    pub customer_id: CustomerId,
    pub created_by: UserId,
    pub assigned_technician: Option<UserId>,
    pub decided_by: Option<UserId>,

    /// Attachment references (photo/report URIs)
    pub attachments: Vec<String>,
    /// Part and service lines
    pub items: Vec<ClaimItem>,
    /// Append-only status history
    pub history: AuditTrail,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a new claim in its initial status, writing the first
    /// history row.
    pub fn create(
        claim_number: ClaimNumber,
        vehicle_id: VehicleId,
        customer_id: CustomerId,
        reported_failure: String,
        flow: IntakeFlow,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        let status = match flow {
            IntakeFlow::Draft => ClaimStatus::Draft,
            IntakeFlow::Intake => ClaimStatus::Open,
        };

        let mut history = AuditTrail::new();
        history.append(status, created_by, Some("Claim created".to_string()));

        Self {
            id: ClaimId::new_v7(),
            claim_number,
            status,
            repair_type: None,
            is_active: true,
            warranty_cost: None,
            company_paid_cost: None,
            customer_payment_status: CustomerPaymentStatus::NotRequired,
            reported_failure,
            initial_diagnosis: None,
            diagnostic_details: None,
            is_warranty_eligible: None,
            manual_warranty_override: None,
            manual_override_confirmed: false,
            manual_override_confirmed_at: None,
            manual_override_confirmed_by: None,
            applied_warranty_years: None,
            applied_warranty_km: None,
            problem_type: None,
            problem_description: None,
            rejection_reason: None,
            rejection_notes: None,
            rejection_count: 0,
            can_resubmit: true,
            resubmit_count: 0,
            vehicle_id,
            customer_id,
            created_by,
            assigned_technician: None,
            decided_by: None,
            attachments: Vec::new(),
            items: Vec::new(),
            history,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the claim to a new status, appending exactly one history row.
    ///
    /// Transitions out of a terminal status are refused here regardless of
    /// what the caller already checked; this is the aggregate's own
    /// invariant.
    pub fn set_status(
        &mut self,
        status: ClaimStatus,
        changed_by: UserId,
        note: Option<String>,
    ) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.history.append(status, changed_by, note);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the repair type, enforcing the SC-repair lock: once a claim is
    /// `SC_REPAIR` it can never become `EVM_REPAIR`.
    pub fn set_repair_type(&mut self, repair_type: RepairType) -> Result<(), ClaimError> {
        if self.repair_type == Some(RepairType::ScRepair) && repair_type == RepairType::EvmRepair {
            return Err(ClaimError::RepairTypeLocked);
        }
        self.repair_type = Some(repair_type);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Appends a timestamped block to the diagnostic details
    pub fn append_diagnostic_note(&mut self, heading: &str, body: &str) {
        let stamp = Utc::now().format("%Y-%m-%d %H:%M UTC");
        let block = format!("\n\n[{heading} {stamp}]\n{body}");
        match &mut self.diagnostic_details {
            Some(details) => details.push_str(&block),
            None => self.diagnostic_details = Some(block.trim_start().to_string()),
        }
        self.updated_at = Utc::now();
    }

    /// Records an EVM rejection
    pub fn record_rejection(&mut self, reason: String, notes: Option<String>, is_final: bool) {
        self.rejection_reason = Some(reason);
        self.rejection_notes = notes;
        self.rejection_count += 1;
        if is_final {
            self.can_resubmit = false;
        }
        self.updated_at = Utc::now();
    }

    /// Records a resubmission, appending a numbered block to the diagnosis
    /// text and clearing the rejection fields. Fails when the claim has no
    /// resubmission right left.
    pub fn record_resubmission(&mut self, additional_notes: &str) -> Result<(), ClaimError> {
        if !self.can_resubmit {
            return Err(ClaimError::validation(
                "claim has no resubmission right",
            ));
        }
        if self.resubmit_count >= MAX_RESUBMISSIONS {
            return Err(ClaimError::validation(format!(
                "resubmission cap of {MAX_RESUBMISSIONS} reached"
            )));
        }
        self.resubmit_count += 1;
        let block = format!(
            "--- Resubmission #{} ---\n{}",
            self.resubmit_count, additional_notes
        );
        match &mut self.initial_diagnosis {
            Some(diag) => {
                diag.push_str("\n\n");
                diag.push_str(&block);
            }
            None => self.initial_diagnosis = Some(block),
        }
        self.rejection_reason = None;
        self.rejection_notes = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Confirms a pending manual warranty override
    pub fn confirm_manual_override(&mut self, confirmed_by: UserId) -> Result<(), ClaimError> {
        if self.manual_warranty_override.is_none() {
            return Err(ClaimError::validation(
                "no manual override to confirm",
            ));
        }
        self.manual_override_confirmed = true;
        self.manual_override_confirmed_at = Some(Utc::now());
        self.manual_override_confirmed_by = Some(confirmed_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Warranty-tagged part lines, which gate inventory reservation and
    /// the installation check at repair completion
    pub fn warranty_parts(&self) -> impl Iterator<Item = &ClaimItem> {
        self.items.iter().filter(|i| i.is_warranty_part())
    }

    pub fn has_warranty_parts(&self) -> bool {
        self.warranty_parts().next().is_some()
    }

    /// Number of problem reports so far, counted from history
    pub fn problem_report_count(&self) -> usize {
        self.history.count_at(ClaimStatus::ProblemConflict)
    }
}
