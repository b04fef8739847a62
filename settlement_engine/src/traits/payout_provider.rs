use std::fmt::Display;

use thiserror::Error;

use crate::db_types::{Money, OrderId};

/// The external "create transfer" capability of the payment provider.
///
/// Dispatch outcomes are per-seller: a rejection or transport failure for one seller is recorded and must never
/// prevent another seller's payout or touch the order's payment status. Implementations should bound the call with
/// a timeout; a timeout is indistinguishable from any other dispatch failure to the pipeline.
#[allow(async_fn_in_trait)]
pub trait PayoutProvider: Clone {
    async fn dispatch(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutRequest {
    pub shop_id: String,
    pub amount: Money,
    pub order_id: OrderId,
    pub memo: String,
}

impl PayoutRequest {
    pub fn new(shop_id: impl Into<String>, amount: Money, order_id: OrderId) -> Self {
        let shop_id = shop_id.into();
        let memo = format!("Payout for order {order_id} to shop {shop_id}");
        Self { shop_id, amount, order_id, memo }
    }
}

impl Display for PayoutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to shop {} for order {}", self.amount, self.shop_id, self.order_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutReceipt {
    pub transfer_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Error)]
pub enum PayoutProviderError {
    #[error("The provider rejected the transfer: {0}")]
    Rejected(String),
    #[error("Could not reach the payout provider: {0}")]
    Unreachable(String),
}
