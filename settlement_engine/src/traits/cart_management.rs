use thiserror::Error;

/// Cart cleanup after a cart checkout settles. Deleting an already-deleted entry is a no-op, so this collaborator
/// is naturally safe to re-run.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Deletes the given cart entries for the buyer in one batch. Returns the number of entries removed.
    async fn remove_cart_items(&self, buyer_id: &str, item_ids: &[String]) -> Result<u64, CartError>;
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Cart cleanup failed: {0}")]
    CleanupFailed(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::CleanupFailed(e.to_string())
    }
}
