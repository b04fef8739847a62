use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderId, SettlementStep},
    traits::SettlementError,
};

pub async fn step_completed(
    order_id: &OrderId,
    step: SettlementStep,
    conn: &mut SqliteConnection,
) -> Result<bool, SettlementError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM settlement_steps WHERE order_id = $1 AND step = $2")
        .bind(order_id.as_str())
        .bind(step.to_string())
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

pub async fn record_step(
    order_id: &OrderId,
    step: SettlementStep,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    let _ = sqlx::query(
        "INSERT INTO settlement_steps (order_id, step) VALUES ($1, $2) ON CONFLICT (order_id, step) DO NOTHING",
    )
    .bind(order_id.as_str())
    .bind(step.to_string())
    .execute(conn)
    .await?;
    Ok(())
}
