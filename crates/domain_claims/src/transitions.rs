//! Auto-progression table
//!
//! Completion-style operations accept a set of statuses they are valid in.
//! When a claim sits outside that set, the engine attempts a single
//! best-effort hop toward one of the valid targets, using a fixed priority
//! table keyed by the current status. The table is exhaustive: statuses with
//! no row simply cannot auto-progress, and the operation fails instead of
//! silently succeeding from an invalid state.

use crate::status::ClaimStatus;

/// Ordered preferred targets for a single auto-progression hop from the
/// given status. Empty means the status never auto-progresses.
pub fn preferred_targets(current: ClaimStatus) -> &'static [ClaimStatus] {
    use ClaimStatus::*;
    match current {
        Open => &[Assigned, InProgress],
        Assigned => &[InProgress],
        InProgress => &[RepairInProgress, FinalInspection],
        EvmApproved => &[ReadyForRepair, RepairInProgress],
        WaitingForParts => &[ReadyForRepair],
        ReadyForRepair => &[RepairInProgress],
        RepairInProgress => &[FinalInspection],
        ProblemSolved => &[ReadyForRepair],
        FinalInspection => &[ReadyForHandover],
        ReadyForHandover => &[HandoverPending, WorkDone, ClaimDone, InProgress],
        HandoverPending => &[WorkDone, ClaimDone],
        WorkDone => &[ClaimDone],
        ClaimDone => &[Closed],
        CustomerPaid => &[ReadyForRepair],
        CustomerApprovedThirdParty => &[ReadyForRepair],
        // Draft, approval-pending, rejected, conflicted, terminal and
        // customer-gated statuses require an explicit operation to move.
        _ => &[],
    }
}

/// Resolves a single auto-progression hop.
///
/// Returns `None` when the claim is already in the valid set (no hop
/// needed) or when no preferred target is in the valid set (no hop
/// possible); callers distinguish the two by checking membership first.
pub fn resolve_progression(
    current: ClaimStatus,
    valid_set: &[ClaimStatus],
) -> Option<ClaimStatus> {
    if valid_set.contains(&current) {
        return None;
    }
    preferred_targets(current)
        .iter()
        .find(|target| valid_set.contains(target))
        .copied()
}
