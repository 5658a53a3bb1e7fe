//! Unit tests for strongly-typed identifiers

use core_kernel::{ClaimId, CustomerId, PartId, UserId, VehicleId, WorkOrderId};
use uuid::Uuid;

#[test]
fn test_display_prefixes() {
    assert!(ClaimId::new().to_string().starts_with("CLM-"));
    assert!(VehicleId::new().to_string().starts_with("VEH-"));
    assert!(CustomerId::new().to_string().starts_with("CUS-"));
    assert!(UserId::new().to_string().starts_with("USR-"));
    assert!(WorkOrderId::new().to_string().starts_with("WO-"));
    assert!(PartId::new().to_string().starts_with("PRT-"));
}

#[test]
fn test_roundtrip_through_display() {
    let id = ClaimId::new_v7();
    let parsed: ClaimId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn test_parse_bare_uuid() {
    let uuid = Uuid::new_v4();
    let parsed: PartId = uuid.to_string().parse().unwrap();
    assert_eq!(parsed.as_uuid(), &uuid);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("not-a-uuid".parse::<ClaimId>().is_err());
}

#[test]
fn test_serde_is_transparent() {
    let id = VehicleId::new();
    let json = serde_json::to_string(&id).unwrap();
    // Serialized as the bare UUID, no prefix
    assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    let back: VehicleId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn test_distinct_ids_are_unequal() {
    assert_ne!(ClaimId::new(), ClaimId::new());
}
