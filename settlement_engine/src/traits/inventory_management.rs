use thiserror::Error;

use crate::db_types::InventoryDelta;

/// Batched stock adjustment for purchased line items.
///
/// Counters are mutated with additive deltas so that concurrent orders touching the same product never lose
/// updates. The whole batch for one order is applied in a single transaction.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Decrements stock and increments sold-count by `quantity` for every delta in the batch.
    async fn adjust_for_sale(&self, deltas: &[InventoryDelta]) -> Result<(), InventoryError>;
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Inventory adjustment failed: {0}")]
    AdjustmentFailed(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(e: sqlx::Error) -> Self {
        InventoryError::AdjustmentFailed(e.to_string())
    }
}
