//! Claim line items
//!
//! A `ClaimItem` is a part or service line attached to a claim. Items are
//! created during diagnosis or EVM item entry; the cost type is
//! auto-classified at EVM submission time from the vehicle's warranty
//! window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimItemId, Money, PartId};
use domain_vehicle::Vehicle;

/// Who bears the cost of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostType {
    /// Covered by the manufacturer warranty
    Warranty,
    /// Billed as ordinary service work
    Service,
}

/// Lifecycle status of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimItemStatus {
    Proposed,
    Approved,
    Rejected,
}

/// A part or service line attached to a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimItem {
    pub id: ClaimItemId,
    /// Part reference; service-only lines have none
    pub part_id: Option<PartId>,
    pub description: String,
    pub quantity: u32,
    pub unit_cost: Money,
    pub cost_type: CostType,
    pub status: ClaimItemStatus,
    /// Captured part serial, once installed
    pub serial: Option<String>,
}

impl ClaimItem {
    /// Creates a proposed part line
    pub fn part(part_id: PartId, description: impl Into<String>, quantity: u32, unit_cost: Money) -> Self {
        Self {
            id: ClaimItemId::new_v7(),
            part_id: Some(part_id),
            description: description.into(),
            quantity,
            unit_cost,
            cost_type: CostType::Warranty,
            status: ClaimItemStatus::Proposed,
            serial: None,
        }
    }

    /// Creates a proposed service (labor) line
    pub fn service(description: impl Into<String>, unit_cost: Money) -> Self {
        Self {
            id: ClaimItemId::new_v7(),
            part_id: None,
            description: description.into(),
            quantity: 1,
            unit_cost,
            cost_type: CostType::Service,
            status: ClaimItemStatus::Proposed,
            serial: None,
        }
    }

    /// Line total
    pub fn total(&self) -> Money {
        self.unit_cost.times(self.quantity)
    }

    /// True for part lines the warranty pays for; these gate inventory
    /// reservation and the part-installation check at repair completion.
    pub fn is_warranty_part(&self) -> bool {
        self.cost_type == CostType::Warranty && self.part_id.is_some()
    }

    /// Classifies the cost type against the vehicle's warranty window.
    ///
    /// Applied to every item at EVM submission time.
    pub fn classify(&mut self, vehicle: &Vehicle, on_date: NaiveDate) {
        self.cost_type = if vehicle.under_warranty(on_date) {
            CostType::Warranty
        } else {
            CostType::Service
        };
    }
}
