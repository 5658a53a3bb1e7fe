//! Claim status catalog
//!
//! `ClaimStatus` is the state identity of the lifecycle machine. The codes
//! match the catalog entries persisted by the claim store; `label` is the
//! display text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Draft,
    Open,
    Assigned,
    InProgress,
    PendingApproval,
    PendingEvmApproval,
    EvmApproved,
    EvmRejected,
    PendingParts,
    WaitingForParts,
    ReadyForRepair,
    RepairInProgress,
    ProblemConflict,
    ProblemSolved,
    FinalInspection,
    ReadyForHandover,
    HandoverPending,
    WorkDone,
    ClaimDone,
    Closed,
    Cancelled,
    CustomerPaymentPending,
    CustomerPaid,
    PendingCustomerApproval,
    CustomerApprovedThirdParty,
}

impl ClaimStatus {
    /// Machine-readable status code
    pub fn code(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "DRAFT",
            ClaimStatus::Open => "OPEN",
            ClaimStatus::Assigned => "ASSIGNED",
            ClaimStatus::InProgress => "IN_PROGRESS",
            ClaimStatus::PendingApproval => "PENDING_APPROVAL",
            ClaimStatus::PendingEvmApproval => "PENDING_EVM_APPROVAL",
            ClaimStatus::EvmApproved => "EVM_APPROVED",
            ClaimStatus::EvmRejected => "EVM_REJECTED",
            ClaimStatus::PendingParts => "PENDING_PARTS",
            ClaimStatus::WaitingForParts => "WAITING_FOR_PARTS",
            ClaimStatus::ReadyForRepair => "READY_FOR_REPAIR",
            ClaimStatus::RepairInProgress => "REPAIR_IN_PROGRESS",
            ClaimStatus::ProblemConflict => "PROBLEM_CONFLICT",
            ClaimStatus::ProblemSolved => "PROBLEM_SOLVED",
            ClaimStatus::FinalInspection => "FINAL_INSPECTION",
            ClaimStatus::ReadyForHandover => "READY_FOR_HANDOVER",
            ClaimStatus::HandoverPending => "HANDOVER_PENDING",
            ClaimStatus::WorkDone => "WORK_DONE",
            ClaimStatus::ClaimDone => "CLAIM_DONE",
            ClaimStatus::Closed => "CLOSED",
            ClaimStatus::Cancelled => "CANCELLED",
            ClaimStatus::CustomerPaymentPending => "CUSTOMER_PAYMENT_PENDING",
            ClaimStatus::CustomerPaid => "CUSTOMER_PAID",
            ClaimStatus::PendingCustomerApproval => "PENDING_CUSTOMER_APPROVAL",
            ClaimStatus::CustomerApprovedThirdParty => "CUSTOMER_APPROVED_THIRD_PARTY",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "Draft",
            ClaimStatus::Open => "Open",
            ClaimStatus::Assigned => "Assigned",
            ClaimStatus::InProgress => "In progress",
            ClaimStatus::PendingApproval => "Pending approval",
            ClaimStatus::PendingEvmApproval => "Pending EVM approval",
            ClaimStatus::EvmApproved => "Approved by EVM",
            ClaimStatus::EvmRejected => "Rejected by EVM",
            ClaimStatus::PendingParts => "Pending parts",
            ClaimStatus::WaitingForParts => "Waiting for parts",
            ClaimStatus::ReadyForRepair => "Ready for repair",
            ClaimStatus::RepairInProgress => "Repair in progress",
            ClaimStatus::ProblemConflict => "Problem reported",
            ClaimStatus::ProblemSolved => "Problem solved",
            ClaimStatus::FinalInspection => "Final inspection",
            ClaimStatus::ReadyForHandover => "Ready for handover",
            ClaimStatus::HandoverPending => "Handover pending",
            ClaimStatus::WorkDone => "Work done",
            ClaimStatus::ClaimDone => "Claim done",
            ClaimStatus::Closed => "Closed",
            ClaimStatus::Cancelled => "Cancelled",
            ClaimStatus::CustomerPaymentPending => "Customer payment pending",
            ClaimStatus::CustomerPaid => "Customer paid",
            ClaimStatus::PendingCustomerApproval => "Pending customer approval",
            ClaimStatus::CustomerApprovedThirdParty => "Customer approved third-party repair",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Closed | ClaimStatus::Cancelled)
    }

    /// Statuses in which the diagnostic record may still be edited
    pub fn allows_diagnostic_update(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Draft
                | ClaimStatus::Open
                | ClaimStatus::Assigned
                | ClaimStatus::InProgress
                | ClaimStatus::PendingParts
                | ClaimStatus::WaitingForParts
                | ClaimStatus::ReadyForRepair
                | ClaimStatus::RepairInProgress
        )
    }

    /// Statuses from which a technician may report a problem to the EVM
    pub fn allows_problem_report(&self) -> bool {
        matches!(
            self,
            ClaimStatus::EvmApproved
                | ClaimStatus::ProblemSolved
                | ClaimStatus::WaitingForParts
                | ClaimStatus::ReadyForRepair
                | ClaimStatus::RepairInProgress
        )
    }
}

/// Explicit deny-list of regressions for direct status updates.
///
/// Transitions out of a terminal status are always denied; beyond that a
/// small set of backward hops is blocked because they would rewind work
/// that already happened.
pub fn is_denied_regression(from: ClaimStatus, to: ClaimStatus) -> bool {
    if from.is_terminal() {
        return true;
    }
    matches!(
        (from, to),
        (ClaimStatus::ClaimDone, ClaimStatus::Draft)
            | (ClaimStatus::ClaimDone, ClaimStatus::Open)
            | (ClaimStatus::WorkDone, ClaimStatus::Draft)
            | (ClaimStatus::WorkDone, ClaimStatus::Open)
            | (ClaimStatus::EvmApproved, ClaimStatus::PendingEvmApproval)
            | (_, ClaimStatus::Draft)
    ) && from != ClaimStatus::Draft
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .iter()
            .find(|status| status.code() == s)
            .copied()
            .ok_or_else(|| format!("unknown claim status code: {s}"))
    }
}

/// Every status in the catalog, in lifecycle order
pub const ALL_STATUSES: [ClaimStatus; 25] = [
    ClaimStatus::Draft,
    ClaimStatus::Open,
    ClaimStatus::Assigned,
    ClaimStatus::InProgress,
    ClaimStatus::PendingApproval,
    ClaimStatus::PendingEvmApproval,
    ClaimStatus::EvmApproved,
    ClaimStatus::EvmRejected,
    ClaimStatus::PendingParts,
    ClaimStatus::WaitingForParts,
    ClaimStatus::ReadyForRepair,
    ClaimStatus::RepairInProgress,
    ClaimStatus::ProblemConflict,
    ClaimStatus::ProblemSolved,
    ClaimStatus::FinalInspection,
    ClaimStatus::ReadyForHandover,
    ClaimStatus::HandoverPending,
    ClaimStatus::WorkDone,
    ClaimStatus::ClaimDone,
    ClaimStatus::Closed,
    ClaimStatus::Cancelled,
    ClaimStatus::CustomerPaymentPending,
    ClaimStatus::CustomerPaid,
    ClaimStatus::PendingCustomerApproval,
    ClaimStatus::CustomerApprovedThirdParty,
];
