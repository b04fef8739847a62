use thiserror::Error;

use crate::db_types::{CartItem, Notification, Order, OrderId, OrderItem, Product, SettlementLine, TransferErrorRecord};

/// Read-side queries over the settlement store. The pipeline itself only needs [`crate::traits::SettlementDatabase`];
/// these methods exist for tests, reconciliation tooling and the read paths through which buyers and sellers later
/// observe order state.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderQueryError>;

    async fn fetch_settlement_lines(&self, order_id: &OrderId) -> Result<Vec<SettlementLine>, OrderQueryError>;

    async fn fetch_transfer_errors(&self, order_id: &OrderId) -> Result<Vec<TransferErrorRecord>, OrderQueryError>;

    async fn fetch_notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, OrderQueryError>;

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderQueryError>;

    async fn fetch_cart_items(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderQueryError>;
}

#[derive(Debug, Error)]
pub enum OrderQueryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderQueryError {
    fn from(e: sqlx::Error) -> Self {
        OrderQueryError::DatabaseError(e.to_string())
    }
}
