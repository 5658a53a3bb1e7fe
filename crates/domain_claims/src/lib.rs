//! Claims Lifecycle Domain
//!
//! This crate implements the warranty claim lifecycle from intake through
//! diagnosis, manufacturer (EVM) approval, repair, inspection, handover, and
//! closure.
//!
//! # Claim Lifecycle
//!
//! ```text
//! DRAFT/OPEN -> diagnosed -> PENDING_APPROVAL -> PENDING_EVM_APPROVAL
//!   -> EVM_APPROVED -> READY_FOR_REPAIR | WAITING_FOR_PARTS
//!   -> REPAIR_IN_PROGRESS -> FINAL_INSPECTION -> READY_FOR_HANDOVER
//!   -> CLAIM_DONE -> CLOSED
//! ```
//!
//! The engine (`ClaimLifecycleEngine`) owns the transition rules and
//! coordinates collaborators through the port traits in [`ports`]. Every
//! status change appends exactly one audit-trail entry, and non-essential
//! side effects (notifications, archival, eligibility refresh) are executed
//! as fault-isolated advisory effects after the primary transition.

pub mod advisory;
pub mod authorization;
pub mod claim;
pub mod engine;
pub mod error;
pub mod history;
pub mod inventory;
pub mod item;
pub mod ports;
pub mod readiness;
pub mod status;
pub mod transitions;

pub use advisory::AdvisoryOutcome;
pub use authorization::{can_intake, can_perform, Actor, ClaimAction, Role};
pub use claim::{
    Claim, ClaimNumber, CustomerPaymentStatus, IntakeFlow, ProblemType, RepairType,
    MAX_PROBLEM_REPORTS, MAX_RESUBMISSIONS,
};
pub use engine::{
    ApproveClaimRequest, ClaimLifecycleEngine, CreateClaimRequest, CustomerRef, DiagnosticUpdate,
    EngineOutcome, NextAction, RejectClaimRequest, SerialAssignment, SubmitToEvmRequest,
};
pub use error::ClaimError;
pub use history::{AuditTrail, StatusChange};
pub use inventory::{InventoryCoordinator, PartShortage, ReservationOutcome};
pub use item::{ClaimItem, ClaimItemStatus, CostType};
pub use ports::{
    ClaimStore, CustomerDirectory, EligibilityGate, EligibilityReport, InstalledPart,
    InventoryStore, NotificationGateway, ServiceHistoryArchiver, ServiceRecord, StockLevel,
    VehicleLookup, WorkOrderBinder,
};
pub use readiness::{check_readiness, MissingRequirement};
pub use status::{is_denied_regression, ClaimStatus};
pub use transitions::{preferred_targets, resolve_progression};
