use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderId, PaymentStatus};

/// Published once per order, after the pending→completed transition has been persisted and the downstream steps
/// have run. Duplicate webhook deliveries never produce a second event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
}

impl OrderSettledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published when a failure or expiry event moves a pending order into a terminal non-paid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: PaymentStatus,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.payment_status;
        Self { order, status }
    }
}

/// Published for each seller whose payout dispatch failed. The corresponding transfer error record has already
/// been written when this fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFailedEvent {
    pub order_id: OrderId,
    pub shop_id: String,
    pub amount: Money,
    pub message: String,
}
