//! Append-only audit trail of claim status changes
//!
//! Every transition of a claim's status produces exactly one entry, written
//! in the same operation. Entries are never mutated or deleted; the trail is
//! persisted with the aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::UserId;

use crate::status::ClaimStatus;

/// One recorded status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status the claim moved to
    pub status: ClaimStatus,
    /// User who caused the change
    pub changed_by: UserId,
    /// Free-text note
    pub note: Option<String>,
    /// When the change happened
    pub changed_at: DateTime<Utc>,
}

/// Append-only log of a claim's status changes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<StatusChange>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. There is deliberately no removal or mutation API.
    pub fn append(&mut self, status: ClaimStatus, changed_by: UserId, note: Option<String>) {
        self.entries.push(StatusChange {
            status,
            changed_by,
            note,
            changed_at: Utc::now(),
        });
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[StatusChange] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts how many times the claim has been in the given status.
    ///
    /// The problem-report cap counts `PROBLEM_CONFLICT` entries this way.
    pub fn count_at(&self, status: ClaimStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// The most recent entry, if any
    pub fn last(&self) -> Option<&StatusChange> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_count() {
        let user = UserId::new();
        let mut trail = AuditTrail::new();
        assert!(trail.is_empty());

        trail.append(ClaimStatus::Open, user, None);
        trail.append(ClaimStatus::ProblemConflict, user, Some("coolant leak".into()));
        trail.append(ClaimStatus::ProblemSolved, user, None);
        trail.append(ClaimStatus::ProblemConflict, user, None);

        assert_eq!(trail.len(), 4);
        assert_eq!(trail.count_at(ClaimStatus::ProblemConflict), 2);
        assert_eq!(trail.last().unwrap().status, ClaimStatus::ProblemConflict);
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let user = UserId::new();
        let mut trail = AuditTrail::new();
        trail.append(ClaimStatus::Open, user, None);
        trail.append(ClaimStatus::PendingApproval, user, None);

        let statuses: Vec<_> = trail.entries().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![ClaimStatus::Open, ClaimStatus::PendingApproval]);
    }
}
