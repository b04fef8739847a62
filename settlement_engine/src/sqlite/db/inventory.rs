use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{InventoryDelta, Product},
    traits::InventoryError,
};

/// Applies one delta: stock down, sold-count up, by the purchased quantity. Additive so that concurrent orders for
/// the same product never lose updates.
pub async fn apply_delta(delta: &InventoryDelta, conn: &mut SqliteConnection) -> Result<(), InventoryError> {
    let res = sqlx::query("UPDATE products SET stock = stock - $1, sold = sold + $2 WHERE product_id = $3")
        .bind(delta.quantity)
        .bind(delta.quantity)
        .bind(&delta.product_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Inventory delta for product {} applied to {} rows", delta.product_id, res.rows_affected());
    Ok(())
}

pub async fn fetch_product(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE product_id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}
