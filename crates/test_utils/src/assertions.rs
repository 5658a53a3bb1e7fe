//! Custom assertion helpers for domain types

use domain_claims::{Claim, ClaimStatus};

/// Asserts the claim's status and that the newest audit-trail row matches
/// it, the pairing every engine transition must maintain.
pub fn assert_status_with_history(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(claim.status, expected, "claim status mismatch");
    let last = claim
        .history
        .last()
        .expect("claim has no audit trail entries");
    assert_eq!(
        last.status, expected,
        "newest audit-trail row does not match the claim status"
    );
}

/// Asserts the exact audit-trail length
pub fn assert_history_len(claim: &Claim, expected: usize) {
    assert_eq!(
        claim.history.len(),
        expected,
        "audit-trail length mismatch; rows: {:?}",
        claim
            .history
            .entries()
            .iter()
            .map(|e| e.status)
            .collect::<Vec<_>>()
    );
}
