//! Claim lifecycle engine
//!
//! The engine owns the Claim entity's state, transition rules, and
//! orchestration of collaborators. Every public operation executes as one
//! atomic unit against the claim: validate authorization and current state,
//! apply the transition, persist through the claim store, then run advisory
//! side effects whose failures never roll back the primary change.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use core_kernel::{ClaimId, CustomerId, PartId, PortError, UserId, VehicleId};
use domain_vehicle::NewCustomer;

use crate::advisory::AdvisoryOutcome;
use crate::authorization::{can_intake, can_perform, Actor, ClaimAction};
use crate::claim::{
    Claim, ClaimNumber, CustomerPaymentStatus, IntakeFlow, ProblemType, RepairType,
    MAX_PROBLEM_REPORTS,
};
use crate::error::ClaimError;
use crate::inventory::{InventoryCoordinator, ReservationOutcome};
use crate::item::{ClaimItem, ClaimItemStatus};
use crate::ports::{
    ClaimStore, CustomerDirectory, EligibilityGate, InventoryStore, NewWorkOrder,
    NotificationAudience, NotificationChannel, NotificationGateway, ServiceHistoryArchiver,
    ServiceRecord, VehicleLookup, WorkOrderBinder,
};
use crate::readiness::check_readiness;
use crate::status::{is_denied_regression, ClaimStatus};
use crate::transitions::resolve_progression;

/// Result of an engine operation: the updated claim projection plus the
/// outcome of every advisory effect that ran.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub claim: Claim,
    pub advisories: Vec<AdvisoryOutcome>,
}

impl EngineOutcome {
    fn new(claim: Claim) -> Self {
        Self {
            claim,
            advisories: Vec::new(),
        }
    }

    fn with(mut self, advisory: AdvisoryOutcome) -> Self {
        self.advisories.push(advisory);
        self
    }
}

/// Reference to an existing customer or intake data for a new one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CustomerRef {
    Existing(CustomerId),
    New(NewCustomer),
}

/// Request to create a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClaimRequest {
    pub vehicle_id: VehicleId,
    pub customer: CustomerRef,
    pub reported_failure: String,
    pub flow: IntakeFlow,
    pub assigned_technician: Option<UserId>,
    pub attachments: Vec<String>,
}

/// Diagnostic record update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticUpdate {
    pub initial_diagnosis: Option<String>,
    pub diagnostic_details: Option<String>,
    pub repair_type: Option<RepairType>,
    pub is_warranty_eligible: Option<bool>,
    pub manual_warranty_override: Option<bool>,
    /// Replaces the claim's line items when present
    pub items: Option<Vec<ClaimItem>>,
}

/// Request to submit a claim to the EVM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitToEvmRequest {
    pub claim_id: ClaimId,
    /// Skips the readiness re-check
    pub force_submit: bool,
}

/// A part serial to register against the vehicle on approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialAssignment {
    pub part_id: PartId,
    pub serial: String,
}

/// EVM approval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveClaimRequest {
    pub claim_id: ClaimId,
    pub notes: Option<String>,
    pub serial_assignments: Vec<SerialAssignment>,
}

/// EVM rejection request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectClaimRequest {
    pub claim_id: ClaimId,
    pub reason: String,
    pub notes: Option<String>,
    /// A final rejection clears the resubmission right
    pub is_final: bool,
}

/// Technician's choice when confirming a problem resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NextAction {
    /// Resume the repair
    ReadyForRepair,
    /// Leave the claim as-is; a new problem report follows
    ReportNewProblem,
}

/// The claim lifecycle engine
#[derive(Clone)]
pub struct ClaimLifecycleEngine {
    claims: Arc<dyn ClaimStore>,
    vehicles: Arc<dyn VehicleLookup>,
    customers: Arc<dyn CustomerDirectory>,
    eligibility: Arc<dyn EligibilityGate>,
    inventory: InventoryCoordinator,
    work_orders: Arc<dyn WorkOrderBinder>,
    notifications: Arc<dyn NotificationGateway>,
    archiver: Arc<dyn ServiceHistoryArchiver>,
}

impl ClaimLifecycleEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        claims: Arc<dyn ClaimStore>,
        vehicles: Arc<dyn VehicleLookup>,
        customers: Arc<dyn CustomerDirectory>,
        eligibility: Arc<dyn EligibilityGate>,
        inventory_store: Arc<dyn InventoryStore>,
        work_orders: Arc<dyn WorkOrderBinder>,
        notifications: Arc<dyn NotificationGateway>,
        archiver: Arc<dyn ServiceHistoryArchiver>,
    ) -> Self {
        Self {
            claims,
            vehicles,
            customers,
            eligibility,
            inventory: InventoryCoordinator::new(inventory_store),
            work_orders,
            notifications,
            archiver,
        }
    }

    // ------------------------------------------------------------------
    // Intake
    // ------------------------------------------------------------------

    /// Creates a claim, resolving or registering the customer and writing
    /// the first history row. Work-order binding for an assigned
    /// technician is advisory: its failure is logged, not fatal.
    #[instrument(skip(self, request), fields(vehicle = %request.vehicle_id))]
    pub async fn create_claim(
        &self,
        request: CreateClaimRequest,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        if !can_intake(&actor) {
            return Err(ClaimError::unauthorized(format!(
                "role {:?} may not register claims",
                actor.role
            )));
        }

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await
            .map_err(|e| match e {
                PortError::NotFound { .. } => {
                    ClaimError::VehicleNotFound(request.vehicle_id.to_string())
                }
                other => ClaimError::Port(other),
            })?;

        let customer = match request.customer {
            CustomerRef::Existing(id) => self.customers.find_by_id(id).await?,
            CustomerRef::New(new_customer) => {
                new_customer
                    .validate()
                    .map_err(|e| ClaimError::validation(e.to_string()))?;
                self.customers.create(&new_customer).await?
            }
        };

        let year = Utc::now().year();
        let sequence = self.claims.next_claim_sequence(year).await?;

        let mut claim = Claim::create(
            ClaimNumber::new(year, sequence),
            vehicle.id,
            customer.id,
            request.reported_failure,
            request.flow,
            actor.user_id,
        );
        claim.assigned_technician = request.assigned_technician;
        claim.attachments = request.attachments;
        if claim.assigned_technician.is_some() && claim.status == ClaimStatus::Open {
            claim.set_status(ClaimStatus::Assigned, actor.user_id, None)?;
        }

        self.claims.insert(&claim).await?;
        info!(claim = %claim.claim_number, status = %claim.status, "claim created");

        let mut outcome = EngineOutcome::new(claim);
        if let Some(technician_id) = outcome.claim.assigned_technician {
            if outcome.claim.status != ClaimStatus::Draft {
                let result = self
                    .work_orders
                    .create_initial_work_order(&NewWorkOrder {
                        claim_id: outcome.claim.id,
                        technician_id,
                        start_time: Utc::now(),
                        work_type: "WARRANTY_REPAIR".to_string(),
                    })
                    .await;
                outcome = outcome.with(AdvisoryOutcome::record("bind_work_order", result));
            }
        }
        Ok(outcome)
    }

    /// Assigns a technician to an open claim and binds the initial work
    /// order (advisory).
    #[instrument(skip(self))]
    pub async fn assign_technician(
        &self,
        claim_id: ClaimId,
        technician_id: UserId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::Administer)?;
        self.require_status(&claim, &[ClaimStatus::Open])?;

        claim.assigned_technician = Some(technician_id);
        claim.set_status(ClaimStatus::Assigned, actor.user_id, None)?;
        self.claims.save(&claim).await?;

        let result = self
            .work_orders
            .create_initial_work_order(&NewWorkOrder {
                claim_id: claim.id,
                technician_id,
                start_time: Utc::now(),
                work_type: "WARRANTY_REPAIR".to_string(),
            })
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("bind_work_order", result)))
    }

    // ------------------------------------------------------------------
    // Diagnosis and submission
    // ------------------------------------------------------------------

    /// Updates the diagnostic record and branches the status on the
    /// submitted repair type / eligibility verdict.
    #[instrument(skip(self, update))]
    pub async fn update_diagnostic(
        &self,
        claim_id: ClaimId,
        update: DiagnosticUpdate,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::UpdateDiagnostic)?;
        if !claim.status.allows_diagnostic_update() {
            return Err(ClaimError::StatusConflict {
                current: claim.status,
                required: vec![
                    ClaimStatus::Draft,
                    ClaimStatus::Open,
                    ClaimStatus::Assigned,
                    ClaimStatus::InProgress,
                    ClaimStatus::PendingParts,
                    ClaimStatus::WaitingForParts,
                    ClaimStatus::ReadyForRepair,
                    ClaimStatus::RepairInProgress,
                ],
            });
        }

        if let Some(repair_type) = update.repair_type {
            claim.set_repair_type(repair_type)?;
        }
        if let Some(diagnosis) = update.initial_diagnosis {
            claim.initial_diagnosis = Some(diagnosis);
        }
        if let Some(details) = update.diagnostic_details {
            claim.diagnostic_details = Some(details);
        }
        if let Some(eligible) = update.is_warranty_eligible {
            claim.is_warranty_eligible = Some(eligible);
        }
        if let Some(override_value) = update.manual_warranty_override {
            claim.manual_warranty_override = Some(override_value);
            claim.manual_override_confirmed = false;
        }
        if let Some(items) = update.items {
            claim.items = items;
        }

        let mut notify_customer = false;
        if update.repair_type == Some(RepairType::ScRepair) {
            claim.customer_payment_status = CustomerPaymentStatus::Pending;
            self.transition_if_changed(
                &mut claim,
                ClaimStatus::CustomerPaymentPending,
                &actor,
                None,
            )?;
        } else if update.is_warranty_eligible == Some(true) {
            self.transition_if_changed(&mut claim, ClaimStatus::PendingApproval, &actor, None)?;
        } else if update.is_warranty_eligible == Some(false) {
            self.transition_if_changed(
                &mut claim,
                ClaimStatus::PendingCustomerApproval,
                &actor,
                None,
            )?;
            notify_customer = true;
        } else if matches!(claim.status, ClaimStatus::Draft | ClaimStatus::Open) {
            self.transition_if_changed(&mut claim, ClaimStatus::PendingApproval, &actor, None)?;
        }

        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, status = %claim.status, "diagnostic updated");

        let mut outcome = EngineOutcome::new(claim);
        if notify_customer {
            let result = self
                .notifications
                .notify(
                    outcome.claim.id,
                    NotificationAudience::Customer,
                    &[NotificationChannel::Email, NotificationChannel::Sms],
                    &format!(
                        "Claim {} is not covered by warranty; your approval is required to proceed",
                        outcome.claim.claim_number
                    ),
                    actor.user_id,
                )
                .await;
            outcome = outcome.with(AdvisoryOutcome::record("notify_customer", result));
        }

        let refresh = self.refresh_eligibility(&mut outcome.claim).await;
        outcome = outcome.with(AdvisoryOutcome::record("refresh_eligibility", refresh));
        Ok(outcome)
    }

    /// Runs the submission-readiness check and moves the claim to
    /// `PENDING_APPROVAL` only if every requirement passes.
    #[instrument(skip(self))]
    pub async fn mark_ready_for_submission(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::UpdateDiagnostic)?;

        self.ensure_ready(&claim).await?;
        self.transition_if_changed(&mut claim, ClaimStatus::PendingApproval, &actor, None)?;
        self.claims.save(&claim).await?;
        Ok(EngineOutcome::new(claim))
    }

    /// Submits the claim to the EVM, auto-classifying each line's cost
    /// type from the vehicle's warranty window.
    #[instrument(skip(self, request))]
    pub async fn submit_to_evm(
        &self,
        request: SubmitToEvmRequest,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(request.claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::UpdateDiagnostic)?;
        self.require_status(&claim, &[ClaimStatus::PendingApproval])?;

        if !request.force_submit {
            self.ensure_ready(&claim).await?;
        }

        let vehicle = self.vehicles.find_by_id(claim.vehicle_id).await?;
        let today = Utc::now().date_naive();
        for item in &mut claim.items {
            item.classify(&vehicle, today);
        }

        claim.set_status(ClaimStatus::PendingEvmApproval, actor.user_id, None)?;
        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, "submitted to EVM");
        Ok(EngineOutcome::new(claim))
    }

    // ------------------------------------------------------------------
    // EVM decision and inventory coordination
    // ------------------------------------------------------------------

    /// EVM approval. Idempotent: a claim no longer in
    /// `PENDING_EVM_APPROVAL` is returned unchanged.
    ///
    /// Reservation is all-or-nothing: with sufficient availability for
    /// every warranty part the claim moves to `READY_FOR_REPAIR`,
    /// otherwise to `WAITING_FOR_PARTS` with nothing reserved. Two history
    /// rows are written: `EVM_APPROVED`, then the resulting status.
    #[instrument(skip(self, request))]
    pub async fn approve_claim(
        &self,
        request: ApproveClaimRequest,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(request.claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::EvmDecision)?;
        if claim.status != ClaimStatus::PendingEvmApproval {
            info!(claim = %claim.claim_number, status = %claim.status, "approve is a no-op");
            return Ok(EngineOutcome::new(claim));
        }

        let reservation = self
            .inventory
            .check_and_reserve(claim.warranty_parts())
            .await?;
        let next = match &reservation {
            ReservationOutcome::Reserved => ClaimStatus::ReadyForRepair,
            ReservationOutcome::Short(_) => ClaimStatus::WaitingForParts,
        };

        for item in &mut claim.items {
            if item.status == ClaimItemStatus::Proposed {
                item.status = ClaimItemStatus::Approved;
            }
        }
        claim.decided_by = Some(actor.user_id);
        claim.set_status(ClaimStatus::EvmApproved, actor.user_id, request.notes.clone())?;
        claim.set_status(next, actor.user_id, None)?;
        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, status = %claim.status, "EVM approved");

        let mut outcome = EngineOutcome::new(claim);
        for assignment in &request.serial_assignments {
            let result = self
                .vehicles
                .assign_part_serial(
                    outcome.claim.vehicle_id,
                    assignment.part_id,
                    &assignment.serial,
                )
                .await;
            outcome = outcome.with(AdvisoryOutcome::record("assign_part_serial", result));
        }
        let notify = self
            .notifications
            .notify(
                outcome.claim.id,
                NotificationAudience::Customer,
                &[NotificationChannel::Email],
                &format!(
                    "Claim {} was approved by the manufacturer",
                    outcome.claim.claim_number
                ),
                actor.user_id,
            )
            .await;
        Ok(outcome.with(AdvisoryOutcome::record("notify_customer", notify)))
    }

    /// EVM rejection. Idempotent like [`Self::approve_claim`]. A final
    /// rejection clears the resubmission right.
    #[instrument(skip(self, request))]
    pub async fn reject_claim(
        &self,
        request: RejectClaimRequest,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(request.claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::EvmDecision)?;
        if claim.status != ClaimStatus::PendingEvmApproval {
            info!(claim = %claim.claim_number, status = %claim.status, "reject is a no-op");
            return Ok(EngineOutcome::new(claim));
        }

        claim.record_rejection(request.reason.clone(), request.notes.clone(), request.is_final);
        claim.decided_by = Some(actor.user_id);
        claim.set_status(
            ClaimStatus::EvmRejected,
            actor.user_id,
            Some(request.reason),
        )?;
        self.claims.save(&claim).await?;

        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Customer,
                &[NotificationChannel::Email],
                &format!(
                    "Claim {} was rejected by the manufacturer",
                    claim.claim_number
                ),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("notify_customer", notify)))
    }

    /// Resubmits a rejected claim. Only from `EVM_REJECTED`, only while
    /// the resubmission right is intact, capped at one resubmission.
    #[instrument(skip(self))]
    pub async fn resubmit_claim(
        &self,
        claim_id: ClaimId,
        additional_notes: &str,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.require_status(&claim, &[ClaimStatus::EvmRejected])?;

        claim.record_resubmission(additional_notes)?;
        claim.set_status(
            ClaimStatus::PendingEvmApproval,
            actor.user_id,
            Some(format!("Resubmission #{}", claim.resubmit_count)),
        )?;
        self.claims.save(&claim).await?;

        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Evm,
                &[NotificationChannel::Email],
                &format!("Claim {} was resubmitted for review", claim.claim_number),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("notify_evm", notify)))
    }

    // ------------------------------------------------------------------
    // Problem / resolution sub-workflow
    // ------------------------------------------------------------------

    /// Reports a problem to the EVM, capped at five reports per claim.
    #[instrument(skip(self, description))]
    pub async fn report_problem(
        &self,
        claim_id: ClaimId,
        problem_type: ProblemType,
        description: String,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ReportProblem)?;
        if !claim.status.allows_problem_report() {
            return Err(ClaimError::StatusConflict {
                current: claim.status,
                required: vec![
                    ClaimStatus::EvmApproved,
                    ClaimStatus::ProblemSolved,
                    ClaimStatus::WaitingForParts,
                    ClaimStatus::ReadyForRepair,
                    ClaimStatus::RepairInProgress,
                ],
            });
        }
        if claim.problem_report_count() >= MAX_PROBLEM_REPORTS {
            return Err(ClaimError::validation(format!(
                "problem report cap of {MAX_PROBLEM_REPORTS} reached"
            )));
        }

        claim.problem_type = Some(problem_type);
        claim.problem_description = Some(description.clone());
        claim.set_status(ClaimStatus::ProblemConflict, actor.user_id, Some(description))?;
        self.claims.save(&claim).await?;

        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Evm,
                &[NotificationChannel::Email, NotificationChannel::Push],
                &format!("Problem reported on claim {}", claim.claim_number),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("notify_evm", notify)))
    }

    /// EVM resolves a reported problem.
    #[instrument(skip(self, resolution_note))]
    pub async fn resolve_problem(
        &self,
        claim_id: ClaimId,
        resolution_note: String,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ResolveProblem)?;
        self.require_status(&claim, &[ClaimStatus::ProblemConflict])?;

        claim.set_status(
            ClaimStatus::ProblemSolved,
            actor.user_id,
            Some(resolution_note),
        )?;
        self.claims.save(&claim).await?;

        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Technician,
                &[NotificationChannel::Push],
                &format!("Problem on claim {} was resolved", claim.claim_number),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("notify_technician", notify)))
    }

    /// Technician confirms a resolution. `ReadyForRepair` advances the
    /// claim; `ReportNewProblem` is an explicit passthrough, returning the
    /// claim unchanged so a new problem report can follow.
    #[instrument(skip(self))]
    pub async fn confirm_resolution(
        &self,
        claim_id: ClaimId,
        next_action: NextAction,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ConfirmResolution)?;
        self.require_status(&claim, &[ClaimStatus::ProblemSolved])?;

        match next_action {
            NextAction::ReadyForRepair => {
                claim.set_status(ClaimStatus::ReadyForRepair, actor.user_id, None)?;
                self.claims.save(&claim).await?;
                Ok(EngineOutcome::new(claim))
            }
            NextAction::ReportNewProblem => Ok(EngineOutcome::new(claim)),
        }
    }

    // ------------------------------------------------------------------
    // Completion, handover, closure
    // ------------------------------------------------------------------

    /// Completes the repair. Auto-progresses into `REPAIR_IN_PROGRESS`,
    /// then hard-enforces that warranty part lines have at least one
    /// installed-part record before moving to `FINAL_INSPECTION`.
    #[instrument(skip(self))]
    pub async fn complete_repair(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.auto_progress(&mut claim, &[ClaimStatus::RepairInProgress], &actor)?;

        if claim.has_warranty_parts() {
            let installed = self.work_orders.installed_parts(claim.id).await?;
            if installed.is_empty() {
                return Err(ClaimError::validation(
                    "warranty part lines require at least one recorded part installation",
                ));
            }
        }

        claim.set_status(ClaimStatus::FinalInspection, actor.user_id, None)?;
        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, "repair completed");
        Ok(EngineOutcome::new(claim))
    }

    /// Final inspection verdict: pass moves toward handover, fail returns
    /// the claim to the workshop with the findings on record.
    #[instrument(skip(self, notes))]
    pub async fn perform_final_inspection(
        &self,
        claim_id: ClaimId,
        passed: bool,
        notes: Option<String>,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.auto_progress(&mut claim, &[ClaimStatus::FinalInspection], &actor)?;

        if passed {
            claim.set_status(ClaimStatus::ReadyForHandover, actor.user_id, notes)?;
        } else {
            if let Some(ref findings) = notes {
                claim.append_diagnostic_note("INSPECTION FAILED", findings);
            }
            claim.set_status(ClaimStatus::RepairInProgress, actor.user_id, notes)?;
        }
        self.claims.save(&claim).await?;
        Ok(EngineOutcome::new(claim))
    }

    /// Hands the vehicle over. An unsatisfied customer reopens the claim
    /// to `OPEN` with a timestamped issue note; otherwise the claim is
    /// marked done.
    #[instrument(skip(self, issue_note))]
    pub async fn handover_vehicle(
        &self,
        claim_id: ClaimId,
        customer_satisfied: bool,
        issue_note: Option<String>,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.auto_progress(
            &mut claim,
            &[ClaimStatus::ReadyForHandover, ClaimStatus::HandoverPending],
            &actor,
        )?;

        if !customer_satisfied {
            let note = issue_note.unwrap_or_else(|| "Customer not satisfied at handover".into());
            claim.append_diagnostic_note("HANDOVER ISSUE", &note);
            claim.set_status(ClaimStatus::Open, actor.user_id, Some(note))?;
            self.claims.save(&claim).await?;
            info!(claim = %claim.claim_number, "handover refused, claim reopened");
            return Ok(EngineOutcome::new(claim));
        }

        self.finish_claim(claim, actor).await
    }

    /// Marks the claim done and archives the service history (advisory).
    #[instrument(skip(self))]
    pub async fn mark_claim_done(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.auto_progress(
            &mut claim,
            &[
                ClaimStatus::ReadyForHandover,
                ClaimStatus::HandoverPending,
                ClaimStatus::WorkDone,
            ],
            &actor,
        )?;
        self.finish_claim(claim, actor).await
    }

    /// Closes the claim: settles inventory for the parts actually used,
    /// then transitions to the terminal `CLOSED` status.
    #[instrument(skip(self))]
    pub async fn close_claim(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        self.auto_progress(&mut claim, &[ClaimStatus::ClaimDone], &actor)?;

        let used = self.work_orders.installed_parts(claim.id).await?;
        self.inventory.settle(&used).await?;

        claim.set_status(ClaimStatus::Closed, actor.user_id, None)?;
        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, "claim closed");

        let archive = self.archive_service_history(&claim).await;
        Ok(EngineOutcome::new(claim)
            .with(AdvisoryOutcome::record("archive_service_history", archive)))
    }

    // ------------------------------------------------------------------
    // Direct status updates and administration
    // ------------------------------------------------------------------

    /// Direct status update with the regression deny-list. Reaching
    /// `CLAIM_DONE` or `CLOSED` archives the service history (advisory).
    #[instrument(skip(self, note))]
    pub async fn update_claim_status(
        &self,
        claim_id: ClaimId,
        new_status: ClaimStatus,
        note: Option<String>,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ChangeStatus)?;
        if is_denied_regression(claim.status, new_status) {
            return Err(ClaimError::InvalidTransition {
                from: claim.status,
                to: new_status,
            });
        }

        claim.set_status(new_status, actor.user_id, note)?;
        self.claims.save(&claim).await?;

        let mut outcome = EngineOutcome::new(claim);
        if matches!(new_status, ClaimStatus::ClaimDone | ClaimStatus::Closed) {
            let archive = self.archive_service_history(&outcome.claim).await;
            outcome = outcome.with(AdvisoryOutcome::record("archive_service_history", archive));
        }
        Ok(outcome)
    }

    /// Cancels a non-terminal claim.
    #[instrument(skip(self, reason))]
    pub async fn cancel_claim(
        &self,
        claim_id: ClaimId,
        reason: String,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::Administer)?;

        claim.set_status(ClaimStatus::Cancelled, actor.user_id, Some(reason))?;
        self.claims.save(&claim).await?;

        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Customer,
                &[NotificationChannel::Email],
                &format!("Claim {} was cancelled", claim.claim_number),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim).with(AdvisoryOutcome::record("notify_customer", notify)))
    }

    /// Soft-deactivates a draft. Claims are never physically deleted.
    #[instrument(skip(self))]
    pub async fn deactivate_draft(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::Administer)?;
        self.require_status(&claim, &[ClaimStatus::Draft])?;

        claim.is_active = false;
        claim.updated_at = Utc::now();
        self.claims.save(&claim).await?;
        Ok(EngineOutcome::new(claim))
    }

    /// Confirms a pending manual warranty override.
    #[instrument(skip(self))]
    pub async fn confirm_manual_override(
        &self,
        claim_id: ClaimId,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        let mut claim = self.load(claim_id).await?;
        self.authorize(&actor, &claim, ClaimAction::ConfirmOverride)?;
        claim.confirm_manual_override(actor.user_id)?;
        self.claims.save(&claim).await?;
        Ok(EngineOutcome::new(claim))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        self.claims.find_by_id(claim_id).await.map_err(|e| match e {
            PortError::NotFound { .. } => ClaimError::ClaimNotFound(claim_id.to_string()),
            other => ClaimError::Port(other),
        })
    }

    fn authorize(
        &self,
        actor: &Actor,
        claim: &Claim,
        action: ClaimAction,
    ) -> Result<(), ClaimError> {
        if !can_perform(actor, claim, action) {
            return Err(ClaimError::unauthorized(format!(
                "role {:?} may not perform {:?} on claim {}",
                actor.role, action, claim.claim_number
            )));
        }
        Ok(())
    }

    fn require_status(&self, claim: &Claim, required: &[ClaimStatus]) -> Result<(), ClaimError> {
        if required.contains(&claim.status) {
            return Ok(());
        }
        Err(ClaimError::StatusConflict {
            current: claim.status,
            required: required.to_vec(),
        })
    }

    /// Single best-effort auto-progression hop toward the valid set.
    fn auto_progress(
        &self,
        claim: &mut Claim,
        valid: &[ClaimStatus],
        actor: &Actor,
    ) -> Result<(), ClaimError> {
        if valid.contains(&claim.status) {
            return Ok(());
        }
        match resolve_progression(claim.status, valid) {
            Some(target) => {
                info!(claim = %claim.claim_number, from = %claim.status, to = %target, "auto-progressing");
                claim.set_status(target, actor.user_id, Some("Auto-progressed".to_string()))
            }
            None => Err(ClaimError::StatusConflict {
                current: claim.status,
                required: valid.to_vec(),
            }),
        }
    }

    fn transition_if_changed(
        &self,
        claim: &mut Claim,
        target: ClaimStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<(), ClaimError> {
        if claim.status == target {
            return Ok(());
        }
        claim.set_status(target, actor.user_id, note)
    }

    async fn ensure_ready(&self, claim: &Claim) -> Result<(), ClaimError> {
        let vehicle = self.vehicles.find_by_id(claim.vehicle_id).await.ok();
        let customer = self.customers.find_by_id(claim.customer_id).await.ok();
        let missing = check_readiness(claim, vehicle.as_ref(), customer.as_ref());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClaimError::NotReadyForSubmission(missing))
        }
    }

    /// Shared tail of the satisfied-handover and mark-done paths.
    async fn finish_claim(
        &self,
        mut claim: Claim,
        actor: Actor,
    ) -> Result<EngineOutcome, ClaimError> {
        claim.set_status(ClaimStatus::ClaimDone, actor.user_id, None)?;
        self.claims.save(&claim).await?;
        info!(claim = %claim.claim_number, "claim done");

        let archive = self.archive_service_history(&claim).await;
        let notify = self
            .notifications
            .notify(
                claim.id,
                NotificationAudience::Customer,
                &[NotificationChannel::Email],
                &format!("Claim {} is complete", claim.claim_number),
                actor.user_id,
            )
            .await;
        Ok(EngineOutcome::new(claim)
            .with(AdvisoryOutcome::record("archive_service_history", archive))
            .with(AdvisoryOutcome::record("notify_customer", notify)))
    }

    async fn archive_service_history(&self, claim: &Claim) -> Result<(), PortError> {
        let vehicle = self.vehicles.find_by_id(claim.vehicle_id).await?;
        let description = match &claim.initial_diagnosis {
            Some(diag) => format!("{}; {}", claim.reported_failure, diag),
            None => claim.reported_failure.clone(),
        };
        self.archiver
            .archive(&ServiceRecord {
                vehicle_id: claim.vehicle_id,
                customer_id: claim.customer_id,
                service_type: "WARRANTY_REPAIR".to_string(),
                description,
                performed_by: claim.assigned_technician,
                mileage_km: vehicle.mileage_km,
            })
            .await?;
        Ok(())
    }

    /// Best-effort refresh of the applied coverage from the eligibility
    /// evaluator, re-persisting the claim when it answers.
    async fn refresh_eligibility(&self, claim: &mut Claim) -> Result<(), PortError> {
        let report = self.eligibility.check_by_claim_id(claim.id).await?;
        claim.applied_warranty_years = report.applied_years;
        claim.applied_warranty_km = report.applied_km;
        self.claims.save(claim).await?;
        Ok(())
    }
}
