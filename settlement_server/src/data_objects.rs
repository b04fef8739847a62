use serde::{Deserialize, Serialize};

/// The acknowledgement body the payment provider expects. Returned with a 200 on every path that must not be
/// redelivered, including events this service cannot and will never be able to process.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}
