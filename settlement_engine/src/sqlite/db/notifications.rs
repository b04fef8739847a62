use sqlx::SqliteConnection;

use crate::{
    db_types::{NewNotification, Notification},
    traits::NotificationError,
};

/// Records a notification for the recipient. The (order, recipient, kind) unique key suppresses duplicates from
/// replayed webhook deliveries; a suppressed insert returns `false`.
pub async fn insert_notification(
    notification: &NewNotification,
    conn: &mut SqliteConnection,
) -> Result<bool, NotificationError> {
    let kind = notification.kind.to_string();
    let res = sqlx::query(
        r#"
            INSERT INTO notifications (order_id, user_id, kind, title, body, link, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (order_id, user_id, kind) DO NOTHING;
        "#,
    )
    .bind(notification.order_id.as_str())
    .bind(&notification.user_id)
    .bind(kind)
    .bind(&notification.title)
    .bind(&notification.body)
    .bind(&notification.link)
    .bind(notification.data.as_deref())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn notifications_for_user(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let notifications = sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(notifications)
}
