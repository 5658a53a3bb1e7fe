//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities across the claims system.
//! Fixtures are consistent and predictable so tests can assert on exact
//! values.

use chrono::NaiveDate;
use core_kernel::{Currency, CustomerId, Money, PartId, UserId, VehicleId};
use domain_claims::{Actor, ClaimItem, InstalledPart, Role};
use domain_vehicle::{Customer, Vehicle, Vin, WarrantyWindow};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::Usd)
    }

    /// Typical warranty part cost
    pub fn usd_part() -> Money {
        Money::new(dec!(480.00), Currency::Usd)
    }

    /// Typical labor line
    pub fn usd_labor() -> Money {
        Money::new(dec!(95.00), Currency::Usd)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::Usd)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard vehicle purchase date (Mar 1, 2024)
    pub fn purchase_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    /// A date safely inside the standard warranty window
    pub fn in_warranty_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    /// A date past the standard warranty window
    pub fn out_of_warranty_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2033, 6, 15).unwrap()
    }
}

/// Fixture for actor test data
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn sc_staff() -> Actor {
        Actor {
            user_id: UserId::new(),
            role: Role::ScStaff,
        }
    }

    pub fn technician(user_id: UserId) -> Actor {
        Actor {
            user_id,
            role: Role::ScTechnician,
        }
    }

    pub fn evm_staff() -> Actor {
        Actor {
            user_id: UserId::new(),
            role: Role::EvmStaff,
        }
    }

    pub fn admin() -> Actor {
        Actor {
            user_id: UserId::new(),
            role: Role::Admin,
        }
    }
}

/// Fixture for vehicle test data
pub struct VehicleFixtures;

impl VehicleFixtures {
    /// A vehicle well inside its warranty window
    pub fn in_warranty() -> Vehicle {
        Vehicle {
            id: VehicleId::new(),
            vin: Vin::new("5YJ3E1EA7KF317123").unwrap(),
            owner_id: CustomerId::new(),
            model: "Ioniq 5".to_string(),
            purchased_on: TemporalFixtures::purchase_date(),
            mileage_km: 22_000,
            warranty: WarrantyWindow::new(8, 160_000).unwrap(),
        }
    }

    /// A vehicle past its km limit
    pub fn out_of_warranty() -> Vehicle {
        Vehicle {
            mileage_km: 200_000,
            ..Self::in_warranty()
        }
    }
}

/// Fixture for customer test data
pub struct CustomerFixtures;

impl CustomerFixtures {
    pub fn reachable() -> Customer {
        Customer {
            id: CustomerId::new(),
            full_name: "Dana Ives".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: Some("+1-555-0101".to_string()),
        }
    }

    pub fn without_contact() -> Customer {
        Customer {
            id: CustomerId::new(),
            full_name: "Lee Quinn".to_string(),
            email: None,
            phone: None,
        }
    }
}

/// Fixture for claim line items
pub struct ItemFixtures;

impl ItemFixtures {
    /// A single warranty part line for the given part
    pub fn warranty_part(part_id: PartId, quantity: u32) -> ClaimItem {
        ClaimItem::part(part_id, "Battery coolant pump", quantity, MoneyFixtures::usd_part())
    }

    /// A labor-only service line
    pub fn labor() -> ClaimItem {
        ClaimItem::service("Diagnostic labor", MoneyFixtures::usd_labor())
    }
}

/// Fixture for installed-part records
pub struct InstalledPartFixtures;

impl InstalledPartFixtures {
    pub fn installed(part_id: PartId, quantity: u32) -> InstalledPart {
        InstalledPart {
            part_id,
            quantity,
            serial: Some("HV-PUMP-00417".to_string()),
        }
    }
}
