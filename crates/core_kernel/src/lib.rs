//! Core Kernel - Foundational types for the EV warranty system
//!
//! This crate provides the building blocks shared by all domain modules:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers
//! - The port error taxonomy used by collaborator interfaces

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;

pub use error::CoreError;
pub use identifiers::{
    ClaimId, ClaimItemId, CustomerId, LocationId, PartId, ServiceRecordId, UserId, VehicleId,
    WorkOrderId,
};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError};
