use sqlx::SqliteConnection;

use crate::traits::NotificationError;

pub async fn shop_owner(shop_id: &str, conn: &mut SqliteConnection) -> Result<Option<String>, NotificationError> {
    let owner = sqlx::query_scalar("SELECT owner_id FROM shops WHERE shop_id = $1")
        .bind(shop_id)
        .fetch_optional(conn)
        .await?;
    Ok(owner)
}
