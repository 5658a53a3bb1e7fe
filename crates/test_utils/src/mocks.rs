//! In-memory adapters
//!
//! One in-memory implementation per engine port, plus a harness that wires
//! them all into a `ClaimLifecycleEngine`. The adapters record every call
//! so tests can assert on side effects, and each has a failure switch for
//! exercising the advisory fault-isolation paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use core_kernel::{
    ClaimId, CustomerId, DomainPort, PartId, PortError, ServiceRecordId, UserId, VehicleId,
    WorkOrderId,
};
use domain_claims::{
    Claim, ClaimLifecycleEngine, ClaimStore, CustomerDirectory, EligibilityGate,
    EligibilityReport, InstalledPart, InventoryStore, NotificationGateway, ServiceHistoryArchiver,
    ServiceRecord, StockLevel, VehicleLookup, WorkOrderBinder,
};
use domain_claims::ports::{NewWorkOrder, NotificationAudience, NotificationChannel};
use domain_vehicle::{Customer, NewCustomer, Vehicle};

/// In-memory claim store
#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: Mutex<HashMap<ClaimId, Claim>>,
    sequence: AtomicU32,
}

impl InMemoryClaimStore {
    pub fn seed(&self, claim: Claim) {
        self.claims.lock().unwrap().insert(claim.id, claim);
    }

    pub fn get(&self, id: ClaimId) -> Option<Claim> {
        self.claims.lock().unwrap().get(&id).cloned()
    }
}

impl DomainPort for InMemoryClaimStore {}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn find_by_id(&self, id: ClaimId) -> Result<Claim, PortError> {
        self.claims
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn insert(&self, claim: &Claim) -> Result<(), PortError> {
        let mut claims = self.claims.lock().unwrap();
        if claims.contains_key(&claim.id) {
            return Err(PortError::conflict(format!(
                "claim {} already exists",
                claim.id
            )));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn save(&self, claim: &Claim) -> Result<(), PortError> {
        let mut claims = self.claims.lock().unwrap();
        if !claims.contains_key(&claim.id) {
            return Err(PortError::not_found("Claim", claim.id));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn next_claim_sequence(&self, _year: i32) -> Result<u32, PortError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// In-memory vehicle registry
#[derive(Default)]
pub struct InMemoryVehicleLookup {
    vehicles: Mutex<HashMap<VehicleId, Vehicle>>,
    serials: Mutex<Vec<(VehicleId, PartId, String)>>,
    pub fail_serial_assignment: AtomicBool,
}

impl InMemoryVehicleLookup {
    pub fn seed(&self, vehicle: Vehicle) {
        self.vehicles.lock().unwrap().insert(vehicle.id, vehicle);
    }

    pub fn assigned_serials(&self) -> Vec<(VehicleId, PartId, String)> {
        self.serials.lock().unwrap().clone()
    }
}

impl DomainPort for InMemoryVehicleLookup {}

#[async_trait]
impl VehicleLookup for InMemoryVehicleLookup {
    async fn find_by_id(&self, id: VehicleId) -> Result<Vehicle, PortError> {
        self.vehicles
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Vehicle", id))
    }

    async fn find_by_vin(&self, vin: &str) -> Result<Vehicle, PortError> {
        self.vehicles
            .lock()
            .unwrap()
            .values()
            .find(|v| v.vin.as_str() == vin)
            .cloned()
            .ok_or_else(|| PortError::not_found("Vehicle", vin))
    }

    async fn assign_part_serial(
        &self,
        vehicle_id: VehicleId,
        part_id: PartId,
        serial: &str,
    ) -> Result<(), PortError> {
        if self.fail_serial_assignment.load(Ordering::SeqCst) {
            return Err(PortError::connection("vehicle registry unreachable"));
        }
        self.serials
            .lock()
            .unwrap()
            .push((vehicle_id, part_id, serial.to_string()));
        Ok(())
    }
}

/// In-memory customer directory
#[derive(Default)]
pub struct InMemoryCustomerDirectory {
    customers: Mutex<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerDirectory {
    pub fn seed(&self, customer: Customer) {
        self.customers.lock().unwrap().insert(customer.id, customer);
    }

    pub fn get(&self, id: CustomerId) -> Option<Customer> {
        self.customers.lock().unwrap().get(&id).cloned()
    }
}

impl DomainPort for InMemoryCustomerDirectory {}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn find_by_id(&self, id: CustomerId) -> Result<Customer, PortError> {
        self.customers
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Customer", id))
    }

    async fn create(&self, new_customer: &NewCustomer) -> Result<Customer, PortError> {
        let customer = Customer {
            id: CustomerId::new(),
            full_name: new_customer.full_name.clone(),
            email: new_customer.email.clone(),
            phone: new_customer.phone.clone(),
        };
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id, customer.clone());
        Ok(customer)
    }
}

/// Stub eligibility evaluator returning a configurable report
pub struct StubEligibilityGate {
    report: Mutex<EligibilityReport>,
    pub fail: AtomicBool,
}

impl Default for StubEligibilityGate {
    fn default() -> Self {
        Self {
            report: Mutex::new(EligibilityReport {
                eligible: true,
                reasons: Vec::new(),
                applied_years: Some(8),
                applied_km: Some(160_000),
            }),
            fail: AtomicBool::new(false),
        }
    }
}

impl StubEligibilityGate {
    pub fn set_report(&self, report: EligibilityReport) {
        *self.report.lock().unwrap() = report;
    }
}

impl DomainPort for StubEligibilityGate {}

#[async_trait]
impl EligibilityGate for StubEligibilityGate {
    async fn check_by_claim_id(&self, _id: ClaimId) -> Result<EligibilityReport, PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::connection("eligibility evaluator unreachable"));
        }
        Ok(self.report.lock().unwrap().clone())
    }
}

/// In-memory parts inventory
#[derive(Default)]
pub struct InMemoryInventoryStore {
    stock: Mutex<HashMap<PartId, StockLevel>>,
}

impl InMemoryInventoryStore {
    pub fn set_stock(&self, part_id: PartId, total: u32, reserved: u32) {
        self.stock
            .lock()
            .unwrap()
            .insert(part_id, StockLevel { total, reserved });
    }

    pub fn level(&self, part_id: PartId) -> StockLevel {
        self.stock
            .lock()
            .unwrap()
            .get(&part_id)
            .copied()
            .unwrap_or(StockLevel {
                total: 0,
                reserved: 0,
            })
    }
}

impl DomainPort for InMemoryInventoryStore {}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn stock_for(&self, part_id: PartId) -> Result<StockLevel, PortError> {
        Ok(self.level(part_id))
    }

    async fn reserve(&self, part_id: PartId, quantity: u32) -> Result<(), PortError> {
        let mut stock = self.stock.lock().unwrap();
        let level = stock.entry(part_id).or_insert(StockLevel {
            total: 0,
            reserved: 0,
        });
        level.reserved += quantity;
        Ok(())
    }

    async fn consume(&self, part_id: PartId, quantity: u32) -> Result<(), PortError> {
        let mut stock = self.stock.lock().unwrap();
        let level = stock.entry(part_id).or_insert(StockLevel {
            total: 0,
            reserved: 0,
        });
        level.reserved = level.reserved.saturating_sub(quantity);
        level.total = level.total.saturating_sub(quantity);
        Ok(())
    }
}

/// Recording work-order collaborator
#[derive(Default)]
pub struct RecordingWorkOrderBinder {
    orders: Mutex<Vec<NewWorkOrder>>,
    installed: Mutex<HashMap<ClaimId, Vec<InstalledPart>>>,
    pub fail_create: AtomicBool,
}

impl RecordingWorkOrderBinder {
    pub fn record_installed(&self, claim_id: ClaimId, parts: Vec<InstalledPart>) {
        self.installed.lock().unwrap().insert(claim_id, parts);
    }

    pub fn created_orders(&self) -> Vec<NewWorkOrder> {
        self.orders.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingWorkOrderBinder {}

#[async_trait]
impl WorkOrderBinder for RecordingWorkOrderBinder {
    async fn create_initial_work_order(
        &self,
        order: &NewWorkOrder,
    ) -> Result<WorkOrderId, PortError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PortError::connection("work-order service unreachable"));
        }
        self.orders.lock().unwrap().push(order.clone());
        Ok(WorkOrderId::new())
    }

    async fn installed_parts(&self, claim_id: ClaimId) -> Result<Vec<InstalledPart>, PortError> {
        Ok(self
            .installed
            .lock()
            .unwrap()
            .get(&claim_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// A notification captured by the recording gateway
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub claim_id: ClaimId,
    pub audience: NotificationAudience,
    pub channels: Vec<NotificationChannel>,
    pub message: String,
    pub sent_by: UserId,
}

/// Recording notification gateway
#[derive(Default)]
pub struct RecordingNotificationGateway {
    sent: Mutex<Vec<SentNotification>>,
    pub fail: AtomicBool,
}

impl RecordingNotificationGateway {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingNotificationGateway {}

#[async_trait]
impl NotificationGateway for RecordingNotificationGateway {
    async fn notify(
        &self,
        claim_id: ClaimId,
        audience: NotificationAudience,
        channels: &[NotificationChannel],
        message: &str,
        sent_by: UserId,
    ) -> Result<(), PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::connection("notification gateway unreachable"));
        }
        self.sent.lock().unwrap().push(SentNotification {
            claim_id,
            audience,
            channels: channels.to_vec(),
            message: message.to_string(),
            sent_by,
        });
        Ok(())
    }
}

/// Recording service-history archiver
#[derive(Default)]
pub struct RecordingArchiver {
    records: Mutex<Vec<ServiceRecord>>,
    pub fail: AtomicBool,
}

impl RecordingArchiver {
    pub fn archived(&self) -> Vec<ServiceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl DomainPort for RecordingArchiver {}

#[async_trait]
impl ServiceHistoryArchiver for RecordingArchiver {
    async fn archive(&self, record: &ServiceRecord) -> Result<ServiceRecordId, PortError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::connection("archive store unreachable"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(ServiceRecordId::new())
    }
}

/// An engine wired to in-memory adapters, all of which stay reachable for
/// seeding and assertions.
pub struct EngineHarness {
    pub claims: Arc<InMemoryClaimStore>,
    pub vehicles: Arc<InMemoryVehicleLookup>,
    pub customers: Arc<InMemoryCustomerDirectory>,
    pub eligibility: Arc<StubEligibilityGate>,
    pub inventory: Arc<InMemoryInventoryStore>,
    pub work_orders: Arc<RecordingWorkOrderBinder>,
    pub notifications: Arc<RecordingNotificationGateway>,
    pub archiver: Arc<RecordingArchiver>,
    pub engine: ClaimLifecycleEngine,
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHarness {
    pub fn new() -> Self {
        crate::init_test_tracing();
        let claims = Arc::new(InMemoryClaimStore::default());
        let vehicles = Arc::new(InMemoryVehicleLookup::default());
        let customers = Arc::new(InMemoryCustomerDirectory::default());
        let eligibility = Arc::new(StubEligibilityGate::default());
        let inventory = Arc::new(InMemoryInventoryStore::default());
        let work_orders = Arc::new(RecordingWorkOrderBinder::default());
        let notifications = Arc::new(RecordingNotificationGateway::default());
        let archiver = Arc::new(RecordingArchiver::default());

        let engine = ClaimLifecycleEngine::new(
            claims.clone(),
            vehicles.clone(),
            customers.clone(),
            eligibility.clone(),
            inventory.clone(),
            work_orders.clone(),
            notifications.clone(),
            archiver.clone(),
        );

        Self {
            claims,
            vehicles,
            customers,
            eligibility,
            inventory,
            work_orders,
            notifications,
            archiver,
            engine,
        }
    }

    /// Seeds a vehicle and customer, returning their ids
    pub fn seed_vehicle_and_customer(
        &self,
        vehicle: Vehicle,
        customer: Customer,
    ) -> (VehicleId, CustomerId) {
        let ids = (vehicle.id, customer.id);
        self.vehicles.seed(vehicle);
        self.customers.seed(customer);
        ids
    }
}
