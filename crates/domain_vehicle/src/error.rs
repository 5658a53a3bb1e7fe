//! Vehicle domain errors

use thiserror::Error;

/// Errors that can occur in the vehicle domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VehicleError {
    #[error("Invalid VIN: {0}")]
    InvalidVin(String),

    #[error("Invalid warranty window: {0}")]
    InvalidWarrantyWindow(String),

    #[error("Invalid customer data: {0}")]
    InvalidCustomer(String),
}
