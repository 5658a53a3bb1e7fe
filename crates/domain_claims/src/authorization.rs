//! Role-based authorization for engine operations
//!
//! Every guarded operation takes an explicit `Actor`; there is no ambient
//! security context. `can_perform` is a pure function so the guard matrix is
//! unit-testable without any auth framework.

use serde::{Deserialize, Serialize};

use core_kernel::UserId;

use crate::claim::Claim;

/// Role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    ScStaff,
    ScTechnician,
    EvmStaff,
    Admin,
}

/// The acting user for a guarded operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Guarded engine actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    /// Create a claim or edit its draft data
    Intake,
    /// Edit the diagnostic record
    UpdateDiagnostic,
    /// Direct status update / completion-style operations
    ChangeStatus,
    /// Approve or reject on behalf of the EVM
    EvmDecision,
    /// Report a problem to the EVM
    ReportProblem,
    /// Resolve a reported problem
    ResolveProblem,
    /// Confirm a problem resolution
    ConfirmResolution,
    /// Confirm a manual warranty override
    ConfirmOverride,
    /// Cancel the claim or deactivate a draft
    Administer,
}

/// Intake runs before a claim exists, so it is checked on the role alone.
pub fn can_intake(actor: &Actor) -> bool {
    matches!(actor.role, Role::ScStaff | Role::Admin)
}

/// Pure authorization check.
///
/// Technicians act only on claims they are assigned to; staff and admin act
/// on any claim; EVM staff are limited to the approval and problem-resolution
/// surface.
pub fn can_perform(actor: &Actor, claim: &Claim, action: ClaimAction) -> bool {
    use ClaimAction::*;
    use Role::*;

    let is_assigned_technician =
        actor.role == ScTechnician && claim.assigned_technician == Some(actor.user_id);

    match action {
        Intake => can_intake(actor),
        UpdateDiagnostic | ChangeStatus | ReportProblem | ConfirmResolution => {
            matches!(actor.role, ScStaff | Admin) || is_assigned_technician
        }
        EvmDecision | ResolveProblem => matches!(actor.role, EvmStaff | Admin),
        ConfirmOverride | Administer => matches!(actor.role, ScStaff | Admin),
    }
}
