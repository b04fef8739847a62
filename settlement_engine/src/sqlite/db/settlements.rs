use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, NewSettlementLine, OrderId, SettlementLine, TransferErrorRecord},
    traits::SettlementError,
};

/// Stores one seller's settlement line. Lines are unique per (order, shop); a conflicting insert is ignored so the
/// amounts computed on first settlement are never re-deducted or overwritten by a replay.
pub async fn insert_line(line: &NewSettlementLine, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    let _ = sqlx::query(
        r#"
            INSERT INTO settlement_lines (order_id, shop_id, gross, platform_fee, net)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_id, shop_id) DO NOTHING;
        "#,
    )
    .bind(line.order_id.as_str())
    .bind(&line.shop_id)
    .bind(line.gross)
    .bind(line.platform_fee)
    .bind(line.net)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn lines_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<SettlementLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM settlement_lines WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

pub async fn mark_dispatched(
    line_id: i64,
    transfer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    let _ = sqlx::query(
        r#"
            UPDATE settlement_lines
            SET payout_status = 'Dispatched', transfer_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payout_status = 'NotAttempted';
        "#,
    )
    .bind(transfer_id)
    .bind(line_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn mark_failed(line_id: i64, conn: &mut SqliteConnection) -> Result<(), SettlementError> {
    let _ = sqlx::query(
        r#"
            UPDATE settlement_lines
            SET payout_status = 'Failed', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND payout_status = 'NotAttempted';
        "#,
    )
    .bind(line_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_transfer_error(
    order_id: &OrderId,
    shop_id: &str,
    amount: Money,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SettlementError> {
    let _ = sqlx::query("INSERT INTO transfer_errors (order_id, shop_id, amount, message) VALUES ($1, $2, $3, $4)")
        .bind(order_id.as_str())
        .bind(shop_id)
        .bind(amount)
        .bind(message)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn transfer_errors_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransferErrorRecord>, sqlx::Error> {
    let errors = sqlx::query_as("SELECT * FROM transfer_errors WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(errors)
}
