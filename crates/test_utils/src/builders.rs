//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the relevant fields and get defaults for everything
//! else.

use core_kernel::{CustomerId, UserId, VehicleId};
use domain_claims::{Claim, ClaimItem, ClaimNumber, ClaimStatus, IntakeFlow, RepairType};

/// Builder for claims in arbitrary lifecycle positions.
///
/// Status changes go through the aggregate so the audit trail stays
/// consistent with the final status, the same invariant production code
/// maintains.
pub struct TestClaimBuilder {
    flow: IntakeFlow,
    vehicle_id: VehicleId,
    customer_id: CustomerId,
    created_by: UserId,
    reported_failure: String,
    initial_diagnosis: Option<String>,
    repair_type: Option<RepairType>,
    assigned_technician: Option<UserId>,
    items: Vec<ClaimItem>,
    attachments: Vec<String>,
    path: Vec<ClaimStatus>,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    pub fn new() -> Self {
        Self {
            flow: IntakeFlow::Intake,
            vehicle_id: VehicleId::new(),
            customer_id: CustomerId::new(),
            created_by: UserId::new(),
            reported_failure: "Sudden loss of drive power on highway".to_string(),
            initial_diagnosis: Some("Inverter fault codes P0C00, P0A1B".to_string()),
            repair_type: None,
            assigned_technician: None,
            items: Vec::new(),
            attachments: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn draft(mut self) -> Self {
        self.flow = IntakeFlow::Draft;
        self
    }

    pub fn with_vehicle(mut self, id: VehicleId) -> Self {
        self.vehicle_id = id;
        self
    }

    pub fn with_customer(mut self, id: CustomerId) -> Self {
        self.customer_id = id;
        self
    }

    pub fn with_reported_failure(mut self, failure: impl Into<String>) -> Self {
        self.reported_failure = failure.into();
        self
    }

    pub fn with_diagnosis(mut self, diagnosis: Option<String>) -> Self {
        self.initial_diagnosis = diagnosis;
        self
    }

    pub fn with_repair_type(mut self, repair_type: RepairType) -> Self {
        self.repair_type = Some(repair_type);
        self
    }

    pub fn with_technician(mut self, technician: UserId) -> Self {
        self.assigned_technician = Some(technician);
        self
    }

    pub fn with_item(mut self, item: ClaimItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_attachment(mut self, uri: impl Into<String>) -> Self {
        self.attachments.push(uri.into());
        self
    }

    /// Walks the claim through the given statuses, one history row each
    pub fn through(mut self, path: &[ClaimStatus]) -> Self {
        self.path.extend_from_slice(path);
        self
    }

    /// Shorthand for a claim sitting at a single target status
    pub fn in_status(self, status: ClaimStatus) -> Self {
        self.through(&[status])
    }

    pub fn build(self) -> Claim {
        let mut claim = Claim::create(
            ClaimNumber::new(2026, 1),
            self.vehicle_id,
            self.customer_id,
            self.reported_failure,
            self.flow,
            self.created_by,
        );
        claim.initial_diagnosis = self.initial_diagnosis;
        claim.assigned_technician = self.assigned_technician;
        claim.items = self.items;
        claim.attachments = self.attachments;
        if let Some(repair_type) = self.repair_type {
            claim.set_repair_type(repair_type).unwrap();
        }
        for status in self.path {
            claim.set_status(status, self.created_by, None).unwrap();
        }
        claim
    }
}
