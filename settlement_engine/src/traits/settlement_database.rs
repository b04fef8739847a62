use thiserror::Error;

use crate::{
    db_types::{Order, OrderId, PaymentStatus, SettlementLine, SettlementStep},
    settlement_api::OrderAggregate,
    traits::OrderManagement,
};

/// The order store behind the settlement pipeline.
///
/// The two transition methods are the heart of the idempotency guard: both are conditional writes keyed on the
/// order's current payment status, so a duplicate or out-of-order delivery observes "no rows changed" rather than
/// re-applying side effects. Everything else in the pipeline assumes that a `Some` return from [`Self::settle_order`]
/// happens at most once per order.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Loads the order, its line items grouped per seller, the originating cart item ids and any linked sub-order
    /// ids as one consistent view.
    async fn fetch_order_aggregate(&self, order_id: &OrderId) -> Result<OrderAggregate, SettlementError>;

    /// Transitions the order from `Pending` to `Completed` in a single conditional write, persisting the charge
    /// reference, the payment timestamp and the `Processing` fulfillment status together.
    ///
    /// Returns the updated order, or `None` if the order was not `Pending` (the caller must then treat the event as
    /// a duplicate and perform no further action).
    async fn settle_order(&self, order_id: &OrderId, charge_id: &str) -> Result<Option<Order>, SettlementError>;

    /// Transitions the order from `Pending` to `Failed` or `Expired`, recording the provider's failure reason.
    ///
    /// Returns the updated order, or `None` if the order was not `Pending`. A completed order is never overwritten,
    /// regardless of delivery order.
    async fn annul_order(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        reason: Option<String>,
    ) -> Result<Option<Order>, SettlementError>;

    /// Computes and stores one settlement line per seller group (net = gross - fee). Lines are keyed unique on
    /// (order, shop); re-running for the same order is a no-op and the stored amounts are returned unchanged.
    async fn create_settlement_lines(&self, aggregate: &OrderAggregate) -> Result<Vec<SettlementLine>, SettlementError>;

    /// Marks a settlement line as dispatched and records the provider's transfer reference.
    async fn mark_payout_dispatched(&self, line_id: i64, transfer_id: &str) -> Result<(), SettlementError>;

    /// Marks a settlement line as failed and appends a transfer error record in the same transaction.
    async fn mark_payout_failed(&self, line: &SettlementLine, message: &str) -> Result<(), SettlementError>;

    /// Sets the order's payout-completion flag: payout has been *attempted* for every seller. Per-seller success or
    /// failure lives on the settlement lines and the transfer error log.
    async fn set_payout_completed(&self, order_id: &OrderId) -> Result<(), SettlementError>;

    /// Applies the parent's completed-payment transition to every linked sub-order still `Pending`, sharing the
    /// parent's charge reference and payment timestamp. Returns the sub-orders that transitioned.
    async fn propagate_to_sub_orders(&self, parent: &Order) -> Result<Vec<Order>, SettlementError>;

    /// Whether the given downstream step already ran for this order.
    async fn step_completed(&self, order_id: &OrderId, step: SettlementStep) -> Result<bool, SettlementError>;

    /// Durably records that the given downstream step ran for this order.
    async fn record_step(&self, order_id: &OrderId, step: SettlementStep) -> Result<(), SettlementError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        SettlementError::DatabaseError(e.to_string())
    }
}
