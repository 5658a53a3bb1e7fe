//! Customer value objects

use serde::{Deserialize, Serialize};

use core_kernel::CustomerId;

use crate::error::VehicleError;

/// A customer on record with the service center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// True if the customer can be reached on at least one channel.
    ///
    /// The submission-readiness check requires this before a claim can go
    /// to the manufacturer.
    pub fn has_contact(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
            || self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Details for registering a customer during claim intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewCustomer {
    /// Validates the intake data before it is handed to the directory
    pub fn validate(&self) -> Result<(), VehicleError> {
        if self.full_name.trim().is_empty() {
            return Err(VehicleError::InvalidCustomer(
                "full name is required".to_string(),
            ));
        }
        if self.email.is_none() && self.phone.is_none() {
            return Err(VehicleError::InvalidCustomer(
                "at least one contact channel is required".to_string(),
            ));
        }
        Ok(())
    }
}
