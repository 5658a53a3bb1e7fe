//! Vehicle value objects

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CustomerId, VehicleId};

use crate::error::VehicleError;

/// A validated Vehicle Identification Number
///
/// 17 characters, uppercase alphanumeric, excluding I, O and Q per
/// ISO 3779. Stored normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Parses and validates a VIN
    pub fn new(raw: impl AsRef<str>) -> Result<Self, VehicleError> {
        let normalized = raw.as_ref().trim().to_ascii_uppercase();

        if normalized.len() != 17 {
            return Err(VehicleError::InvalidVin(format!(
                "expected 17 characters, got {}",
                normalized.len()
            )));
        }

        if let Some(bad) = normalized
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() || matches!(c, 'I' | 'O' | 'Q'))
        {
            return Err(VehicleError::InvalidVin(format!(
                "disallowed character '{bad}'"
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns the VIN string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Vin {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vin::new(s)
    }
}

/// Manufacturer warranty window for a vehicle
///
/// Coverage runs from the purchase date for `years` or until the odometer
/// passes `km_limit`, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyWindow {
    /// Coverage duration in years from purchase
    pub years: u32,
    /// Odometer limit in kilometers
    pub km_limit: u32,
}

impl WarrantyWindow {
    pub fn new(years: u32, km_limit: u32) -> Result<Self, VehicleError> {
        if years == 0 || km_limit == 0 {
            return Err(VehicleError::InvalidWarrantyWindow(
                "years and km limit must both be positive".to_string(),
            ));
        }
        Ok(Self { years, km_limit })
    }

    /// Returns true if the window still covers the vehicle at the given
    /// date and odometer reading.
    pub fn covers(&self, purchased_on: NaiveDate, on_date: NaiveDate, mileage_km: u32) -> bool {
        if mileage_km > self.km_limit {
            return false;
        }
        let expiry = purchased_on
            .checked_add_months(chrono::Months::new(self.years * 12))
            .unwrap_or(NaiveDate::MAX);
        on_date <= expiry
    }
}

/// A registered vehicle, as returned by the vehicle registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique identifier
    pub id: VehicleId,
    /// Validated VIN
    pub vin: Vin,
    /// Owning customer
    pub owner_id: CustomerId,
    /// Model designation
    pub model: String,
    /// Date of first sale
    pub purchased_on: NaiveDate,
    /// Last known odometer reading in kilometers
    pub mileage_km: u32,
    /// Manufacturer warranty window
    pub warranty: WarrantyWindow,
}

impl Vehicle {
    /// Returns true if the manufacturer warranty covers the vehicle on
    /// the given date at its current mileage.
    pub fn under_warranty(&self, on_date: NaiveDate) -> bool {
        self.warranty
            .covers(self.purchased_on, on_date, self.mileage_km)
    }
}
