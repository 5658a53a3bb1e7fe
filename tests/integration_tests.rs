//! Integration tests for the warranty claim lifecycle
//!
//! These tests drive the full engine against in-memory adapters and verify
//! the end-to-end workflows: intake through diagnosis, EVM decision,
//! repair, inspection, handover, and closure.

use core_kernel::PartId;
use domain_claims::{
    ApproveClaimRequest, ClaimError, ClaimStatus, CreateClaimRequest, CustomerRef,
    DiagnosticUpdate, IntakeFlow, NextAction, ProblemType, RejectClaimRequest, RepairType,
    SerialAssignment, SubmitToEvmRequest, MAX_PROBLEM_REPORTS,
};
use domain_claims::claim::Claim;
use domain_vehicle::NewCustomer;
use test_utils::{
    assert_history_len, assert_status_with_history, ActorFixtures, CustomerFixtures,
    EngineHarness, InstalledPartFixtures, ItemFixtures, VehicleFixtures,
};

use core_kernel::ClaimId;
use domain_claims::Actor;

/// Creates an intake claim for a seeded vehicle and customer
async fn create_open_claim(harness: &EngineHarness, actor: Actor) -> Claim {
    let (vehicle_id, customer_id) = harness
        .seed_vehicle_and_customer(VehicleFixtures::in_warranty(), CustomerFixtures::reachable());
    harness
        .engine
        .create_claim(
            CreateClaimRequest {
                vehicle_id,
                customer: CustomerRef::Existing(customer_id),
                reported_failure: "Sudden loss of drive power on highway".to_string(),
                flow: IntakeFlow::Intake,
                assigned_technician: None,
                attachments: Vec::new(),
            },
            actor,
        )
        .await
        .unwrap()
        .claim
}

/// Drives a fresh claim to PENDING_EVM_APPROVAL with one warranty part
/// line, returning the claim and the part id
async fn claim_awaiting_evm(harness: &EngineHarness, actor: Actor) -> (Claim, PartId) {
    let claim = create_open_claim(harness, actor).await;
    let part_id = PartId::new();

    harness
        .engine
        .update_diagnostic(
            claim.id,
            DiagnosticUpdate {
                initial_diagnosis: Some("Inverter fault codes P0C00, P0A1B".to_string()),
                repair_type: Some(RepairType::EvmRepair),
                is_warranty_eligible: Some(true),
                items: Some(vec![ItemFixtures::warranty_part(part_id, 2)]),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    let outcome = harness
        .engine
        .submit_to_evm(
            SubmitToEvmRequest {
                claim_id: claim.id,
                force_submit: false,
            },
            actor,
        )
        .await
        .unwrap();

    (outcome.claim, part_id)
}

fn approve_request(claim_id: ClaimId) -> ApproveClaimRequest {
    ApproveClaimRequest {
        claim_id,
        notes: None,
        serial_assignments: Vec::new(),
    }
}

// ============================================================================
// Intake and diagnosis workflow
// ============================================================================

mod intake_workflow {
    use super::*;

    #[tokio::test]
    async fn test_intake_creates_open_claim_with_history() {
        let harness = EngineHarness::new();
        let claim = create_open_claim(&harness, ActorFixtures::sc_staff()).await;

        assert_status_with_history(&claim, ClaimStatus::Open);
        assert_history_len(&claim, 1);
        assert!(claim.claim_number.as_str().starts_with("CLM-"));
        assert!(claim.is_active);
        assert!(harness.claims.get(claim.id).is_some());
    }

    #[tokio::test]
    async fn test_intake_registers_new_customer() {
        let harness = EngineHarness::new();
        let vehicle = VehicleFixtures::in_warranty();
        let vehicle_id = vehicle.id;
        harness.vehicles.seed(vehicle);

        let outcome = harness
            .engine
            .create_claim(
                CreateClaimRequest {
                    vehicle_id,
                    customer: CustomerRef::New(NewCustomer {
                        full_name: "Riley Moss".to_string(),
                        email: Some("riley@example.com".to_string()),
                        phone: None,
                    }),
                    reported_failure: "Charging port door stuck closed".to_string(),
                    flow: IntakeFlow::Intake,
                    assigned_technician: None,
                    attachments: Vec::new(),
                },
                ActorFixtures::sc_staff(),
            )
            .await
            .unwrap();

        // The directory issued an id and the claim references it
        assert!(harness.customers.get(outcome.claim.customer_id).is_some());
    }

    #[tokio::test]
    async fn test_intake_with_technician_binds_work_order() {
        let harness = EngineHarness::new();
        let (vehicle_id, customer_id) = harness.seed_vehicle_and_customer(
            VehicleFixtures::in_warranty(),
            CustomerFixtures::reachable(),
        );
        let technician = ActorFixtures::sc_staff().user_id;

        let outcome = harness
            .engine
            .create_claim(
                CreateClaimRequest {
                    vehicle_id,
                    customer: CustomerRef::Existing(customer_id),
                    reported_failure: "Sudden loss of drive power".to_string(),
                    flow: IntakeFlow::Intake,
                    assigned_technician: Some(technician),
                    attachments: Vec::new(),
                },
                ActorFixtures::sc_staff(),
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::Assigned);
        let orders = harness.work_orders.created_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].technician_id, technician);
    }

    #[tokio::test]
    async fn test_evm_staff_cannot_register_claims() {
        let harness = EngineHarness::new();
        let (vehicle_id, customer_id) = harness.seed_vehicle_and_customer(
            VehicleFixtures::in_warranty(),
            CustomerFixtures::reachable(),
        );

        let err = harness
            .engine
            .create_claim(
                CreateClaimRequest {
                    vehicle_id,
                    customer: CustomerRef::Existing(customer_id),
                    reported_failure: "Sudden loss of drive power".to_string(),
                    flow: IntakeFlow::Intake,
                    assigned_technician: None,
                    attachments: Vec::new(),
                },
                ActorFixtures::evm_staff(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_diagnosis_moves_claim_to_pending_approval() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let outcome = harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    initial_diagnosis: Some("Coolant pump seized".to_string()),
                    repair_type: Some(RepairType::EvmRepair),
                    is_warranty_eligible: Some(true),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::PendingApproval);
        // The eligibility refresh ran and stored the applied coverage
        let stored = harness.claims.get(claim.id).unwrap();
        assert_eq!(stored.applied_warranty_years, Some(8));
        assert_eq!(stored.applied_warranty_km, Some(160_000));
    }

    #[tokio::test]
    async fn test_sc_repair_diagnosis_awaits_customer_payment() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let outcome = harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    initial_diagnosis: Some("Out-of-warranty wear item".to_string()),
                    repair_type: Some(RepairType::ScRepair),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::CustomerPaymentPending);
    }

    #[tokio::test]
    async fn test_sc_repair_lock_survives_later_updates() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    repair_type: Some(RepairType::ScRepair),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap();

        let err = harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    repair_type: Some(RepairType::EvmRepair),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::RepairTypeLocked));
    }

    #[tokio::test]
    async fn test_submission_blocked_until_ready() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        // No diagnosis and no attachment yet
        let err = harness
            .engine
            .mark_ready_for_submission(claim.id, staff)
            .await
            .unwrap_err();
        match err {
            ClaimError::NotReadyForSubmission(missing) => {
                assert!(!missing.is_empty());
            }
            other => panic!("expected readiness failure, got {other:?}"),
        }
    }
}

// ============================================================================
// EVM decision workflow
// ============================================================================

mod evm_decision_workflow {
    use super::*;

    #[tokio::test]
    async fn test_approval_reserves_parts_and_writes_two_history_rows() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);
        let rows_before = claim.history.len();

        let outcome = harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::ReadyForRepair);
        assert_history_len(&outcome.claim, rows_before + 2);
        let statuses: Vec<_> = outcome
            .claim
            .history
            .entries()
            .iter()
            .map(|e| e.status)
            .collect();
        assert_eq!(
            &statuses[rows_before..],
            &[ClaimStatus::EvmApproved, ClaimStatus::ReadyForRepair]
        );
        assert_eq!(harness.inventory.level(part_id).reserved, 2);
    }

    #[tokio::test]
    async fn test_approval_with_shortage_reserves_nothing() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 1, 0); // needs 2

        let outcome = harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::WaitingForParts);
        assert_eq!(harness.inventory.level(part_id).reserved, 0);
    }

    #[tokio::test]
    async fn test_approval_is_idempotent() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);

        let first = harness
            .engine
            .approve_claim(approve_request(claim.id), evm)
            .await
            .unwrap();
        let second = harness
            .engine
            .approve_claim(approve_request(claim.id), evm)
            .await
            .unwrap();

        // No double reservation, no extra history
        assert_eq!(harness.inventory.level(part_id).reserved, 2);
        assert_eq!(second.claim.history.len(), first.claim.history.len());
        assert_eq!(second.claim.status, first.claim.status);
        assert!(second.advisories.is_empty());
    }

    #[tokio::test]
    async fn test_approval_applies_serial_assignments() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);

        let outcome = harness
            .engine
            .approve_claim(
                ApproveClaimRequest {
                    claim_id: claim.id,
                    notes: Some("approved per TSB 24-081".to_string()),
                    serial_assignments: vec![SerialAssignment {
                        part_id,
                        serial: "HV-PUMP-00417".to_string(),
                    }],
                },
                ActorFixtures::evm_staff(),
            )
            .await
            .unwrap();

        let serials = harness.vehicles.assigned_serials();
        assert_eq!(serials.len(), 1);
        assert_eq!(serials[0].1, part_id);
        assert_eq!(serials[0].2, "HV-PUMP-00417");
        assert!(outcome.advisories.iter().all(|a| a.succeeded));
    }

    #[tokio::test]
    async fn test_sc_staff_cannot_decide_for_the_evm() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, _) = claim_awaiting_evm(&harness, staff).await;

        let err = harness
            .engine
            .approve_claim(approve_request(claim.id), staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_rejection_and_single_resubmission() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, _) = claim_awaiting_evm(&harness, staff).await;

        let rejected = harness
            .engine
            .reject_claim(
                RejectClaimRequest {
                    claim_id: claim.id,
                    reason: "INSUFFICIENT_EVIDENCE".to_string(),
                    notes: Some("photos too blurry".to_string()),
                    is_final: false,
                },
                evm,
            )
            .await
            .unwrap();
        assert_status_with_history(&rejected.claim, ClaimStatus::EvmRejected);
        assert_eq!(rejected.claim.rejection_count, 1);
        assert!(rejected.claim.can_resubmit);

        let resubmitted = harness
            .engine
            .resubmit_claim(claim.id, "added inverter measurement log", staff)
            .await
            .unwrap();
        assert_status_with_history(&resubmitted.claim, ClaimStatus::PendingEvmApproval);
        assert_eq!(resubmitted.claim.resubmit_count, 1);
        assert!(resubmitted.claim.rejection_reason.is_none());

        // A second rejection exhausts the resubmission cap
        harness
            .engine
            .reject_claim(
                RejectClaimRequest {
                    claim_id: claim.id,
                    reason: "NOT_COVERED".to_string(),
                    notes: None,
                    is_final: false,
                },
                evm,
            )
            .await
            .unwrap();
        let err = harness
            .engine
            .resubmit_claim(claim.id, "one more try", staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[tokio::test]
    async fn test_final_rejection_clears_resubmission_right() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, _) = claim_awaiting_evm(&harness, staff).await;

        let rejected = harness
            .engine
            .reject_claim(
                RejectClaimRequest {
                    claim_id: claim.id,
                    reason: "FRAUD_SUSPECTED".to_string(),
                    notes: None,
                    is_final: true,
                },
                ActorFixtures::evm_staff(),
            )
            .await
            .unwrap();
        assert!(!rejected.claim.can_resubmit);

        let err = harness
            .engine
            .resubmit_claim(claim.id, "please reconsider", staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejection_is_idempotent() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, _) = claim_awaiting_evm(&harness, staff).await;

        let first = harness
            .engine
            .reject_claim(
                RejectClaimRequest {
                    claim_id: claim.id,
                    reason: "NOT_COVERED".to_string(),
                    notes: None,
                    is_final: false,
                },
                evm,
            )
            .await
            .unwrap();
        let second = harness
            .engine
            .reject_claim(
                RejectClaimRequest {
                    claim_id: claim.id,
                    reason: "NOT_COVERED".to_string(),
                    notes: None,
                    is_final: true,
                },
                evm,
            )
            .await
            .unwrap();

        assert_eq!(second.claim.history.len(), first.claim.history.len());
        assert_eq!(second.claim.rejection_count, 1);
        // The no-op second call must not clear the resubmission right
        assert!(second.claim.can_resubmit);
    }
}

// ============================================================================
// Problem / resolution workflow
// ============================================================================

mod problem_workflow {
    use super::*;

    async fn approved_claim(harness: &EngineHarness) -> (Claim, PartId) {
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);
        let outcome = harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();
        (outcome.claim, part_id)
    }

    #[tokio::test]
    async fn test_problem_report_and_resolution_round_trip() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, _) = approved_claim(&harness).await;

        let reported = harness
            .engine
            .report_problem(
                claim.id,
                ProblemType::PartMismatch,
                "Delivered pump has wrong connector".to_string(),
                staff,
            )
            .await
            .unwrap();
        assert_status_with_history(&reported.claim, ClaimStatus::ProblemConflict);

        let resolved = harness
            .engine
            .resolve_problem(claim.id, "Correct pump dispatched".to_string(), evm)
            .await
            .unwrap();
        assert_status_with_history(&resolved.claim, ClaimStatus::ProblemSolved);

        let confirmed = harness
            .engine
            .confirm_resolution(claim.id, NextAction::ReadyForRepair, staff)
            .await
            .unwrap();
        assert_status_with_history(&confirmed.claim, ClaimStatus::ReadyForRepair);
    }

    #[tokio::test]
    async fn test_report_new_problem_leaves_claim_unchanged() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, _) = approved_claim(&harness).await;

        harness
            .engine
            .report_problem(claim.id, ProblemType::Other, "coolant leak".to_string(), staff)
            .await
            .unwrap();
        harness
            .engine
            .resolve_problem(claim.id, "torque spec updated".to_string(), evm)
            .await
            .unwrap();

        let confirmed = harness
            .engine
            .confirm_resolution(claim.id, NextAction::ReportNewProblem, staff)
            .await
            .unwrap();
        assert_eq!(confirmed.claim.status, ClaimStatus::ProblemSolved);

        // And a follow-up report is accepted from PROBLEM_SOLVED
        let again = harness
            .engine
            .report_problem(
                claim.id,
                ProblemType::AdditionalDamageFound,
                "harness chafing found".to_string(),
                staff,
            )
            .await
            .unwrap();
        assert_status_with_history(&again.claim, ClaimStatus::ProblemConflict);
    }

    #[tokio::test]
    async fn test_sixth_problem_report_is_refused() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let evm = ActorFixtures::evm_staff();
        let (claim, _) = approved_claim(&harness).await;

        for round in 0..MAX_PROBLEM_REPORTS {
            harness
                .engine
                .report_problem(
                    claim.id,
                    ProblemType::Other,
                    format!("problem round {round}"),
                    staff,
                )
                .await
                .unwrap();
            harness
                .engine
                .resolve_problem(claim.id, format!("resolution {round}"), evm)
                .await
                .unwrap();
            harness
                .engine
                .confirm_resolution(claim.id, NextAction::ReadyForRepair, staff)
                .await
                .unwrap();
        }

        let err = harness
            .engine
            .report_problem(claim.id, ProblemType::Other, "one more".to_string(), staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[tokio::test]
    async fn test_problem_report_refused_in_wrong_status() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let err = harness
            .engine
            .report_problem(claim.id, ProblemType::Other, "too early".to_string(), staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::StatusConflict { .. }));
    }
}

// ============================================================================
// Repair, inspection, handover, and closure
// ============================================================================

mod completion_workflow {
    use super::*;

    async fn ready_for_repair(harness: &EngineHarness) -> (Claim, PartId) {
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);
        let outcome = harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();
        (outcome.claim, part_id)
    }

    #[tokio::test]
    async fn test_complete_repair_requires_installed_parts() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, _) = ready_for_repair(&harness).await;

        // Warranty part lines but no installation recorded
        let err = harness
            .engine
            .complete_repair(claim.id, staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[tokio::test]
    async fn test_complete_repair_auto_progresses_into_repair() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = ready_for_repair(&harness).await;
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);

        // READY_FOR_REPAIR hops to REPAIR_IN_PROGRESS, then FINAL_INSPECTION
        let outcome = harness.engine.complete_repair(claim.id, staff).await.unwrap();
        assert_status_with_history(&outcome.claim, ClaimStatus::FinalInspection);
        let statuses: Vec<_> = outcome
            .claim
            .history
            .entries()
            .iter()
            .map(|e| e.status)
            .collect();
        assert!(statuses.contains(&ClaimStatus::RepairInProgress));
    }

    #[tokio::test]
    async fn test_failed_inspection_returns_to_workshop() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = ready_for_repair(&harness).await;
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);
        harness.engine.complete_repair(claim.id, staff).await.unwrap();

        let outcome = harness
            .engine
            .perform_final_inspection(
                claim.id,
                false,
                Some("Coolant residue at pump flange".to_string()),
                staff,
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::RepairInProgress);
        let details = outcome.claim.diagnostic_details.unwrap();
        assert!(details.contains("INSPECTION FAILED"));
        assert!(details.contains("Coolant residue"));
    }

    #[tokio::test]
    async fn test_unsatisfied_handover_reopens_claim() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = ready_for_repair(&harness).await;
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);
        harness.engine.complete_repair(claim.id, staff).await.unwrap();
        harness
            .engine
            .perform_final_inspection(claim.id, true, None, staff)
            .await
            .unwrap();

        let outcome = harness
            .engine
            .handover_vehicle(
                claim.id,
                false,
                Some("Rattle from dashboard at 80 km/h".to_string()),
                staff,
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::Open);
        let details = outcome.claim.diagnostic_details.unwrap();
        assert!(details.contains("HANDOVER ISSUE"));
        assert!(details.contains("Rattle from dashboard"));
    }

    #[tokio::test]
    async fn test_satisfied_handover_completes_and_archives() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = ready_for_repair(&harness).await;
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);
        harness.engine.complete_repair(claim.id, staff).await.unwrap();
        harness
            .engine
            .perform_final_inspection(claim.id, true, None, staff)
            .await
            .unwrap();

        let outcome = harness
            .engine
            .handover_vehicle(claim.id, true, None, staff)
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::ClaimDone);
        let archived = harness.archiver.archived();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].vehicle_id, outcome.claim.vehicle_id);
        assert_eq!(archived[0].service_type, "WARRANTY_REPAIR");
    }

    #[tokio::test]
    async fn test_closure_settles_inventory() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = ready_for_repair(&harness).await;
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);
        harness.engine.complete_repair(claim.id, staff).await.unwrap();
        harness
            .engine
            .perform_final_inspection(claim.id, true, None, staff)
            .await
            .unwrap();
        harness
            .engine
            .handover_vehicle(claim.id, true, None, staff)
            .await
            .unwrap();

        let outcome = harness.engine.close_claim(claim.id, staff).await.unwrap();
        assert_status_with_history(&outcome.claim, ClaimStatus::Closed);

        // 10 on hand, 2 reserved at approval, 2 consumed at closure
        let level = harness.inventory.level(part_id);
        assert_eq!(level.total, 8);
        assert_eq!(level.reserved, 0);

        // Closed is terminal
        let err = harness
            .engine
            .update_claim_status(claim.id, ClaimStatus::Open, None, staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidTransition { .. }));
    }
}

// ============================================================================
// Direct status updates and administration
// ============================================================================

mod administration {
    use super::*;

    #[tokio::test]
    async fn test_direct_update_denies_regressions() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let err = harness
            .engine
            .update_claim_status(claim.id, ClaimStatus::Draft, None, staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_direct_update_appends_history() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let outcome = harness
            .engine
            .update_claim_status(
                claim.id,
                ClaimStatus::InProgress,
                Some("picked up by workshop".to_string()),
                staff,
            )
            .await
            .unwrap();
        assert_status_with_history(&outcome.claim, ClaimStatus::InProgress);
        assert_history_len(&outcome.claim, 2);
    }

    #[tokio::test]
    async fn test_cancel_claim() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let outcome = harness
            .engine
            .cancel_claim(claim.id, "customer withdrew the claim".to_string(), staff)
            .await
            .unwrap();
        assert_status_with_history(&outcome.claim, ClaimStatus::Cancelled);

        // Terminal: no further operations
        let err = harness
            .engine
            .cancel_claim(claim.id, "again".to_string(), staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_draft_is_soft() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (vehicle_id, customer_id) = harness.seed_vehicle_and_customer(
            VehicleFixtures::in_warranty(),
            CustomerFixtures::reachable(),
        );
        let created = harness
            .engine
            .create_claim(
                CreateClaimRequest {
                    vehicle_id,
                    customer: CustomerRef::Existing(customer_id),
                    reported_failure: "12V battery drains overnight".to_string(),
                    flow: IntakeFlow::Draft,
                    assigned_technician: None,
                    attachments: Vec::new(),
                },
                staff,
            )
            .await
            .unwrap();

        let outcome = harness
            .engine
            .deactivate_draft(created.claim.id, staff)
            .await
            .unwrap();
        assert!(!outcome.claim.is_active);
        assert_eq!(outcome.claim.status, ClaimStatus::Draft);
        // The record still exists
        assert!(harness.claims.get(created.claim.id).is_some());
    }

    #[tokio::test]
    async fn test_deactivate_refused_for_non_draft() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        let err = harness
            .engine
            .deactivate_draft(claim.id, staff)
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::StatusConflict { .. }));
    }

    #[tokio::test]
    async fn test_manual_override_confirmation() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;

        harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    manual_warranty_override: Some(true),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap();

        let outcome = harness
            .engine
            .confirm_manual_override(claim.id, staff)
            .await
            .unwrap();
        assert!(outcome.claim.manual_override_confirmed);
        assert_eq!(
            outcome.claim.manual_override_confirmed_by,
            Some(staff.user_id)
        );
    }
}

// ============================================================================
// Advisory fault isolation
// ============================================================================

mod advisory_isolation {
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_failed_notification_does_not_block_approval() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);
        harness.notifications.fail.store(true, Ordering::SeqCst);

        let outcome = harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::ReadyForRepair);
        let failed: Vec<_> = outcome
            .advisories
            .iter()
            .filter(|a| !a.succeeded)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].effect, "notify_customer");
    }

    #[tokio::test]
    async fn test_failed_archive_does_not_block_completion() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let (claim, part_id) = claim_awaiting_evm(&harness, staff).await;
        harness.inventory.set_stock(part_id, 10, 0);
        harness
            .engine
            .approve_claim(approve_request(claim.id), ActorFixtures::evm_staff())
            .await
            .unwrap();
        harness
            .work_orders
            .record_installed(claim.id, vec![InstalledPartFixtures::installed(part_id, 2)]);
        harness.engine.complete_repair(claim.id, staff).await.unwrap();
        harness
            .engine
            .perform_final_inspection(claim.id, true, None, staff)
            .await
            .unwrap();

        harness.archiver.fail.store(true, Ordering::SeqCst);
        let outcome = harness
            .engine
            .handover_vehicle(claim.id, true, None, staff)
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::ClaimDone);
        assert!(outcome
            .advisories
            .iter()
            .any(|a| a.effect == "archive_service_history" && !a.succeeded));
    }

    #[tokio::test]
    async fn test_failed_eligibility_refresh_keeps_diagnosis() {
        let harness = EngineHarness::new();
        let staff = ActorFixtures::sc_staff();
        let claim = create_open_claim(&harness, staff).await;
        harness.eligibility.fail.store(true, Ordering::SeqCst);

        let outcome = harness
            .engine
            .update_diagnostic(
                claim.id,
                DiagnosticUpdate {
                    initial_diagnosis: Some("Coolant pump seized".to_string()),
                    is_warranty_eligible: Some(true),
                    ..Default::default()
                },
                staff,
            )
            .await
            .unwrap();

        assert_status_with_history(&outcome.claim, ClaimStatus::PendingApproval);
        assert!(outcome
            .advisories
            .iter()
            .any(|a| a.effect == "refresh_eligibility" && !a.succeeded));
        let stored = harness.claims.get(claim.id).unwrap();
        assert!(stored.applied_warranty_years.is_none());
        assert_eq!(stored.status, ClaimStatus::PendingApproval);
    }
}
