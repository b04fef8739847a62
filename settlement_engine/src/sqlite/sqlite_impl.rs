//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the
//! [`crate::traits`] module on a single connection pool.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{carts, inventory, new_pool, notifications, orders, settlements, shops, steps};
use crate::{
    db_types::{
        CartItem,
        InventoryDelta,
        NewNotification,
        Notification,
        Order,
        OrderId,
        OrderItem,
        PaymentStatus,
        Product,
        SettlementLine,
        SettlementStep,
        TransferErrorRecord,
    },
    settlement_api::OrderAggregate,
    traits::{
        CartError,
        CartManagement,
        InventoryError,
        InventoryManagement,
        NotificationError,
        NotificationManagement,
        OrderManagement,
        OrderQueryError,
        SettlementDatabase,
        SettlementError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = super::db::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_order_aggregate(&self, order_id: &OrderId) -> Result<OrderAggregate, SettlementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| SettlementError::OrderNotFound(order_id.clone()))?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        let cart_item_ids = orders::fetch_cart_refs(order_id, &mut tx).await?;
        let sub_order_ids = orders::fetch_sub_order_ids(order_id, &mut tx).await?;
        tx.commit().await?;
        trace!(
            "🗃️ Loaded order {order_id}: {} items, {} cart refs, {} sub-orders",
            items.len(),
            cart_item_ids.len(),
            sub_order_ids.len()
        );
        Ok(OrderAggregate::from_parts(order, items, cart_item_ids, sub_order_ids))
    }

    async fn settle_order(&self, order_id: &OrderId, charge_id: &str) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::settle_order(order_id, charge_id, &mut conn).await
    }

    async fn annul_order(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        reason: Option<String>,
    ) -> Result<Option<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::annul_order(order_id, status, reason, &mut conn).await
    }

    async fn create_settlement_lines(
        &self,
        aggregate: &OrderAggregate,
    ) -> Result<Vec<SettlementLine>, SettlementError> {
        let mut tx = self.pool.begin().await?;
        for line in aggregate.settlement_lines() {
            settlements::insert_line(&line, &mut tx).await?;
        }
        let lines = settlements::lines_for_order(aggregate.order_id(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} settlement lines on record for order {}", lines.len(), aggregate.order_id());
        Ok(lines)
    }

    async fn mark_payout_dispatched(&self, line_id: i64, transfer_id: &str) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        settlements::mark_dispatched(line_id, transfer_id, &mut conn).await
    }

    async fn mark_payout_failed(&self, line: &SettlementLine, message: &str) -> Result<(), SettlementError> {
        let mut tx = self.pool.begin().await?;
        settlements::mark_failed(line.id, &mut tx).await?;
        settlements::insert_transfer_error(&line.order_id, &line.shop_id, line.net, message, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_payout_completed(&self, order_id: &OrderId) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_payout_completed(order_id, &mut conn).await
    }

    async fn propagate_to_sub_orders(&self, parent: &Order) -> Result<Vec<Order>, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        orders::propagate_settlement(parent, &mut conn).await
    }

    async fn step_completed(&self, order_id: &OrderId, step: SettlementStep) -> Result<bool, SettlementError> {
        let mut conn = self.pool.acquire().await?;
        steps::step_completed(order_id, step, &mut conn).await
    }

    async fn record_step(&self, order_id: &OrderId, step: SettlementStep) -> Result<(), SettlementError> {
        let mut conn = self.pool.acquire().await?;
        steps::record_step(order_id, step, &mut conn).await
    }

    async fn close(&mut self) -> Result<(), SettlementError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_settlement_lines(&self, order_id: &OrderId) -> Result<Vec<SettlementLine>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let lines = settlements::lines_for_order(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_transfer_errors(&self, order_id: &OrderId) -> Result<Vec<TransferErrorRecord>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let errors = settlements::transfer_errors_for_order(order_id, &mut conn).await?;
        Ok(errors)
    }

    async fn fetch_notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let notifications = notifications::notifications_for_user(user_id, &mut conn).await?;
        Ok(notifications)
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let product = inventory::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_cart_items(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderQueryError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart_items(buyer_id, &mut conn).await?;
        Ok(items)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn adjust_for_sale(&self, deltas: &[InventoryDelta]) -> Result<(), InventoryError> {
        let mut tx = self.pool.begin().await?;
        for delta in deltas {
            inventory::apply_delta(delta, &mut tx).await?;
        }
        tx.commit().await?;
        trace!("🗃️ Applied {} inventory deltas", deltas.len());
        Ok(())
    }
}

impl CartManagement for SqliteDatabase {
    async fn remove_cart_items(&self, buyer_id: &str, item_ids: &[String]) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_cart_items(buyer_id, item_ids, &mut conn).await
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn notify(&self, notification: NewNotification) -> Result<bool, NotificationError> {
        let mut conn = self.pool.acquire().await?;
        notifications::insert_notification(&notification, &mut conn).await
    }

    async fn shop_owner(&self, shop_id: &str) -> Result<Option<String>, NotificationError> {
        let mut conn = self.pool.acquire().await?;
        shops::shop_owner(shop_id, &mut conn).await
    }
}
