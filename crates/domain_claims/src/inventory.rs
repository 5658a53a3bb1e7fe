//! Inventory coordination
//!
//! Soft-reserves and settles stock for the parts a claim needs. Reservation
//! is all-or-nothing: either every warranty part line has sufficient
//! availability and all of them get reserved, or nothing is reserved at all
//! and the claim waits for parts.
//!
//! The check-then-reserve sequence runs within the engine operation that
//! gates on it; serializing concurrent `reserve` calls against the same part
//! is the store's responsibility (see DESIGN.md on cross-claim contention).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{PartId, PortError};

use crate::item::ClaimItem;
use crate::ports::{InstalledPart, InventoryStore};

/// A part line that could not be covered by available stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartShortage {
    pub part_id: PartId,
    pub requested: u32,
    pub available: u32,
}

/// Result of an all-or-nothing reservation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationOutcome {
    /// Every line was reserved at the default location
    Reserved,
    /// At least one line was short; nothing was reserved
    Short(Vec<PartShortage>),
}

/// Coordinates soft-reservation and settlement against the inventory store
#[derive(Clone)]
pub struct InventoryCoordinator {
    store: Arc<dyn InventoryStore>,
}

impl InventoryCoordinator {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Checks availability for every warranty part line and, only if all of
    /// them fit, soft-reserves each at the default location.
    pub async fn check_and_reserve<'a, I>(&self, lines: I) -> Result<ReservationOutcome, PortError>
    where
        I: Iterator<Item = &'a ClaimItem>,
    {
        let mut requests: Vec<(PartId, u32)> = Vec::new();
        for line in lines {
            if let Some(part_id) = line.part_id {
                requests.push((part_id, line.quantity));
            }
        }

        let mut shortages = Vec::new();
        for (part_id, quantity) in &requests {
            let stock = self.store.stock_for(*part_id).await?;
            if stock.available() < *quantity {
                shortages.push(PartShortage {
                    part_id: *part_id,
                    requested: *quantity,
                    available: stock.available(),
                });
            }
        }

        if !shortages.is_empty() {
            info!(shortages = shortages.len(), "reservation skipped, parts short");
            return Ok(ReservationOutcome::Short(shortages));
        }

        for (part_id, quantity) in &requests {
            self.store.reserve(*part_id, *quantity).await?;
        }
        info!(lines = requests.len(), "parts soft-reserved");
        Ok(ReservationOutcome::Reserved)
    }

    /// Settles the reservation at claim closure: decrements reserved and
    /// on-hand stock by the quantities actually used. The store floors both
    /// counters at zero.
    pub async fn settle(&self, used: &[InstalledPart]) -> Result<(), PortError> {
        for part in used {
            self.store.consume(part.part_id, part.quantity).await?;
        }
        info!(lines = used.len(), "inventory settled");
        Ok(())
    }
}
