//! Vehicle Domain
//!
//! Value objects for the vehicles and customers the claims engine works
//! against. The engine never owns these entities; it reads them through the
//! `VehicleLookup` and `CustomerDirectory` ports. This crate defines the
//! shapes those ports return: a validated VIN, the warranty window used for
//! eligibility and cost-type classification, and customer contact data used
//! by the submission-readiness check.

pub mod customer;
pub mod error;
pub mod vehicle;

pub use customer::{Customer, NewCustomer};
pub use error::VehicleError;
pub use vehicle::{Vehicle, Vin, WarrantyWindow};
