//! Collaborator ports consumed by the claim lifecycle engine
//!
//! Everything outside the claim aggregate (vehicle registry, customer
//! directory, eligibility policy, inventory, work orders, notifications,
//! service-history archival) is reached through one of these traits. No
//! wire format is prescribed; adapters map these semantics onto whatever
//! the deployment uses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    ClaimId, CustomerId, DomainPort, PartId, PortError, ServiceRecordId, UserId, VehicleId,
    WorkOrderId,
};
use domain_vehicle::{Customer, NewCustomer, Vehicle};

use crate::claim::Claim;

/// Persistence boundary for the claim aggregate.
///
/// `save` must persist the aggregate (including its history and items) as
/// one atomic unit; partial application of a transition must not be
/// observable.
#[async_trait]
pub trait ClaimStore: DomainPort {
    async fn find_by_id(&self, id: ClaimId) -> Result<Claim, PortError>;
    async fn insert(&self, claim: &Claim) -> Result<(), PortError>;
    async fn save(&self, claim: &Claim) -> Result<(), PortError>;
    /// Issues the next 6-digit claim-number sequence for the given year.
    /// Uniqueness of the resulting claim number is the store's contract.
    async fn next_claim_sequence(&self, year: i32) -> Result<u32, PortError>;
}

/// Vehicle registry lookup
#[async_trait]
pub trait VehicleLookup: DomainPort {
    async fn find_by_id(&self, id: VehicleId) -> Result<Vehicle, PortError>;
    async fn find_by_vin(&self, vin: &str) -> Result<Vehicle, PortError>;
    /// Registers a part serial against the vehicle. Submitted with EVM
    /// approvals; each assignment is applied individually.
    async fn assign_part_serial(
        &self,
        vehicle_id: VehicleId,
        part_id: PartId,
        serial: &str,
    ) -> Result<(), PortError>;
}

/// Customer directory: resolve an existing customer or register a new one
#[async_trait]
pub trait CustomerDirectory: DomainPort {
    async fn find_by_id(&self, id: CustomerId) -> Result<Customer, PortError>;
    async fn create(&self, customer: &NewCustomer) -> Result<Customer, PortError>;
}

/// Result of a warranty-eligibility evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    pub reasons: Vec<String>,
    pub applied_years: Option<u32>,
    pub applied_km: Option<u32>,
}

/// Warranty-eligibility policy evaluator. Consumed, not redefined, by the
/// engine.
#[async_trait]
pub trait EligibilityGate: DomainPort {
    async fn check_by_claim_id(&self, id: ClaimId) -> Result<EligibilityReport, PortError>;
}

/// Stock position of a part across all locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub total: u32,
    pub reserved: u32,
}

impl StockLevel {
    /// Units not yet soft-reserved
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.reserved)
    }
}

/// Parts inventory at the default location.
///
/// `reserve` increments the reserved counter without touching on-hand
/// stock; `consume` settles a reservation by decrementing both, flooring
/// at zero.
#[async_trait]
pub trait InventoryStore: DomainPort {
    async fn stock_for(&self, part_id: PartId) -> Result<StockLevel, PortError>;
    async fn reserve(&self, part_id: PartId, quantity: u32) -> Result<(), PortError>;
    async fn consume(&self, part_id: PartId, quantity: u32) -> Result<(), PortError>;
}

/// Request to create the work order bound to a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub claim_id: ClaimId,
    pub technician_id: UserId,
    pub start_time: DateTime<Utc>,
    pub work_type: String,
}

/// A part consumed by repair work, per the work-order record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPart {
    pub part_id: PartId,
    pub quantity: u32,
    pub serial: Option<String>,
}

/// Work-order collaborator: binds repair work orders to claims and reports
/// the parts actually installed.
#[async_trait]
pub trait WorkOrderBinder: DomainPort {
    async fn create_initial_work_order(&self, order: &NewWorkOrder)
        -> Result<WorkOrderId, PortError>;
    /// Parts recorded as installed across the claim's work orders.
    /// Used for the repair-completion guard and inventory settlement.
    async fn installed_parts(&self, claim_id: ClaimId) -> Result<Vec<InstalledPart>, PortError>;
}

/// Who a notification is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationAudience {
    Customer,
    Evm,
    Technician,
}

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
}

/// Fire-and-forget messaging. Failures never abort an engine operation.
#[async_trait]
pub trait NotificationGateway: DomainPort {
    async fn notify(
        &self,
        claim_id: ClaimId,
        audience: NotificationAudience,
        channels: &[NotificationChannel],
        message: &str,
        sent_by: UserId,
    ) -> Result<(), PortError>;
}

/// Entry archived into the vehicle's service history when a claim reaches
/// `CLAIM_DONE` or `CLOSED`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub vehicle_id: VehicleId,
    pub customer_id: CustomerId,
    pub service_type: String,
    pub description: String,
    pub performed_by: Option<UserId>,
    pub mileage_km: u32,
}

/// Service-history archival, best-effort
#[async_trait]
pub trait ServiceHistoryArchiver: DomainPort {
    async fn archive(&self, record: &ServiceRecord) -> Result<ServiceRecordId, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level_available() {
        let level = StockLevel {
            total: 10,
            reserved: 4,
        };
        assert_eq!(level.available(), 6);
    }

    #[test]
    fn test_stock_level_available_floors_at_zero() {
        let level = StockLevel {
            total: 3,
            reserved: 5,
        };
        assert_eq!(level.available(), 0);
    }
}
