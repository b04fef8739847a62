use chrono::{DateTime, Utc};
use marketplace_common::Money;
use serde::{Deserialize, Serialize};

/// A request to move funds to a seller's registered payout destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfer {
    /// The provider-side recipient handle. Sellers register their payout destination when onboarding; by
    /// convention the marketplace uses the shop id as the recipient handle.
    pub recipient: String,
    /// Amount in minor currency units.
    pub amount: Money,
    pub currency: String,
    /// Free-form reference carried on the provider's transfer record, e.g. the order id.
    pub reference: String,
    pub memo: String,
}

impl NewTransfer {
    pub fn new(recipient: impl Into<String>, amount: Money, reference: impl Into<String>, memo: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount,
            currency: marketplace_common::BAHT_CURRENCY_CODE.to_string(),
            reference: reference.into(),
            memo: memo.into(),
        }
    }
}

/// The provider's record of a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub recipient: String,
    pub amount: Money,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn describe(&self, fallback: &str) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => fallback.to_string(),
        }
    }
}
