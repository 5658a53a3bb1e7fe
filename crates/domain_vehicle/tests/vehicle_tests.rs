//! Tests for the vehicle domain

use chrono::NaiveDate;
use core_kernel::{CustomerId, VehicleId};
use domain_vehicle::{Customer, NewCustomer, Vehicle, VehicleError, Vin, WarrantyWindow};

fn test_vehicle(purchased_on: NaiveDate, mileage_km: u32, years: u32, km_limit: u32) -> Vehicle {
    Vehicle {
        id: VehicleId::new(),
        vin: Vin::new("5YJ3E1EA7KF317123").unwrap(),
        owner_id: CustomerId::new(),
        model: "Model 3 LR".to_string(),
        purchased_on,
        mileage_km,
        warranty: WarrantyWindow::new(years, km_limit).unwrap(),
    }
}

mod vin {
    use super::*;

    #[test]
    fn test_vin_normalizes_case_and_whitespace() {
        let vin = Vin::new("  wvgzzz5nzjm100001 ").unwrap();
        assert_eq!(vin.as_str(), "WVGZZZ5NZJM100001");
        assert_eq!(vin.to_string(), "WVGZZZ5NZJM100001");
    }

    #[test]
    fn test_vin_from_str() {
        let parsed: Vin = "5YJ3E1EA7KF317123".parse().unwrap();
        assert_eq!(parsed.as_str(), "5YJ3E1EA7KF317123");
    }

    #[test]
    fn test_vin_error_names_offending_character() {
        let err = Vin::new("5YJ3E1EA7KF31712!").unwrap_err();
        match err {
            VehicleError::InvalidVin(msg) => assert!(msg.contains('!')),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_vin_serde_roundtrip() {
        let vin = Vin::new("5YJ3E1EA7KF317123").unwrap();
        let json = serde_json::to_string(&vin).unwrap();
        assert_eq!(json, "\"5YJ3E1EA7KF317123\"");
        let back: Vin = serde_json::from_str(&json).unwrap();
        assert_eq!(vin, back);
    }
}

mod warranty_window {
    use super::*;

    #[test]
    fn test_vehicle_under_warranty_inside_window() {
        let purchased = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        let vehicle = test_vehicle(purchased, 40_000, 8, 160_000);

        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert!(vehicle.under_warranty(today));
    }

    #[test]
    fn test_vehicle_out_of_warranty_by_age() {
        let purchased = NaiveDate::from_ymd_opt(2015, 1, 15).unwrap();
        let vehicle = test_vehicle(purchased, 40_000, 8, 160_000);

        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert!(!vehicle.under_warranty(today));
    }

    #[test]
    fn test_vehicle_out_of_warranty_by_mileage() {
        let purchased = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let vehicle = test_vehicle(purchased, 170_000, 8, 160_000);

        let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert!(!vehicle.under_warranty(today));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let window = WarrantyWindow::new(3, 100_000).unwrap();
        let purchased = NaiveDate::from_ymd_opt(2023, 8, 29).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        assert!(window.covers(purchased, expiry, 100_000));
        assert!(!window.covers(purchased, expiry.succ_opt().unwrap(), 100_000));
    }
}

mod customer {
    use super::*;

    #[test]
    fn test_customer_serde_roundtrip() {
        let customer = Customer {
            id: CustomerId::new(),
            full_name: "Dana Ives".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
        };
        let json = serde_json::to_string(&customer).unwrap();
        let back: Customer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.full_name, "Dana Ives");
        assert!(back.has_contact());
    }

    #[test]
    fn test_new_customer_requires_contact() {
        let nc = NewCustomer {
            full_name: "Dana Ives".to_string(),
            email: None,
            phone: None,
        };
        assert!(matches!(nc.validate(), Err(VehicleError::InvalidCustomer(_))));
    }
}
