use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderId, OrderItem, PaymentStatus},
    traits::SettlementError,
};

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// The cart entries recorded against the order at checkout, for post-settlement cleanup.
pub async fn fetch_cart_refs(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    let ids = sqlx::query_scalar("SELECT cart_item_id FROM order_cart_items WHERE order_id = $1 ORDER BY cart_item_id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(ids)
}

pub async fn fetch_sub_order_ids(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderId>, sqlx::Error> {
    let ids = sqlx::query_scalar("SELECT order_id FROM orders WHERE parent_order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(ids)
}

/// The conditional pending→completed transition. Payment status, fulfillment status, the charge reference and the
/// payment timestamp are persisted in one statement, and only if the order is still pending. `None` means the guard
/// rejected the write and the caller must treat the event as a duplicate.
pub async fn settle_order(
    order_id: &OrderId,
    charge_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SettlementError> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Completed',
                fulfillment_status = 'Processing',
                charge_id = $1,
                paid_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(charge_id)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ settle_order for {order_id} transitioned: {}", order.is_some());
    Ok(order)
}

/// The conditional pending→failed/expired transition. A completed order is never overwritten, so a late failure
/// event for an already-settled order changes nothing.
pub async fn annul_order(
    order_id: &OrderId,
    status: PaymentStatus,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SettlementError> {
    let status = status.to_string();
    let order = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = $1,
                failure_reason = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Applies the parent's completed-payment transition to all pending sub-orders in one batch, sharing the parent's
/// charge reference and payment timestamp.
pub async fn propagate_settlement(parent: &Order, conn: &mut SqliteConnection) -> Result<Vec<Order>, SettlementError> {
    let orders = sqlx::query_as(
        r#"
            UPDATE orders
            SET payment_status = 'Completed',
                fulfillment_status = 'Processing',
                charge_id = $1,
                paid_at = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE parent_order_id = $3 AND payment_status = 'Pending'
            RETURNING *;
        "#,
    )
    .bind(parent.charge_id.as_deref())
    .bind(parent.paid_at)
    .bind(parent.order_id.as_str())
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn set_payout_completed(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    let _ = sqlx::query("UPDATE orders SET payout_completed = 1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1")
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}
