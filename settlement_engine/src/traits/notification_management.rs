use thiserror::Error;

use crate::db_types::NewNotification;

/// Outbound settlement notices. Delivery is fire-and-forget from the pipeline's perspective; the only guarantee
/// this collaborator provides is that at most one notification exists per (order, recipient, kind), so webhook
/// replays cannot double-notify anyone.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Records the notification. Returns `false` if an identical (order, recipient, kind) notice already exists.
    async fn notify(&self, notification: NewNotification) -> Result<bool, NotificationError>;

    /// Resolves a shop to its owner's user id, for addressing seller notices.
    async fn shop_owner(&self, shop_id: &str) -> Result<Option<String>, NotificationError>;
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<sqlx::Error> for NotificationError {
    fn from(e: sqlx::Error) -> Self {
        NotificationError::DeliveryFailed(e.to_string())
    }
}
