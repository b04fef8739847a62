use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{db_types::CartItem, traits::CartError};

/// Deletes the given cart entries for the buyer in one statement. Entries that were already removed simply do not
/// count towards the result.
pub async fn remove_cart_items(
    buyer_id: &str,
    item_ids: &[String],
    conn: &mut SqliteConnection,
) -> Result<u64, CartError> {
    if item_ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("DELETE FROM cart_items WHERE buyer_id = ");
    builder.push_bind(buyer_id);
    builder.push(" AND id IN (");
    let mut in_clause = builder.separated(", ");
    for id in item_ids {
        in_clause.push_bind(id);
    }
    builder.push(")");
    trace!("🗃️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    Ok(res.rows_affected())
}

pub async fn fetch_cart_items(buyer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE buyer_id = $1 ORDER BY id ASC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
