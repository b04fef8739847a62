//! Wire types for the payment provider's charge webhook events.
//!
//! The provider delivers events at-least-once and possibly out of order, so nothing here mutates state: this module
//! only parses and classifies. The settlement pipeline decides what (if anything) to do with the classification.

use serde::{Deserialize, Serialize};

use crate::db_types::OrderId;

pub const CHARGE_COMPLETE: &str = "charge.complete";
pub const CHARGE_FAILED: &str = "charge.failed";
pub const CHARGE_EXPIRED: &str = "charge.expired";

const CHARGE_STATUS_SUCCESSFUL: &str = "successful";
const CHARGE_STATUS_FAILED: &str = "failed";
const CHARGE_STATUS_EXPIRED: &str = "expired";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeEvent {
    /// The provider's event key, e.g. `charge.complete`.
    pub key: String,
    pub data: ChargeObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeObject {
    pub object: String,
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub failure_code: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub metadata: ChargeMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChargeMetadata {
    #[serde(rename = "orderId", alias = "order_id", default)]
    pub order_id: Option<String>,
}

/// What the pipeline should do with an incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeAction {
    /// A successful, paid charge: run the settlement pipeline.
    Settle,
    /// The charge failed: mark the order failed, if it is still pending.
    MarkFailed,
    /// The charge expired before payment: mark the order expired, if it is still pending.
    MarkExpired,
    /// Anything else: acknowledge and do nothing. Unknown statuses are ignored rather than rejected so that new
    /// provider event types do not bounce.
    Ignore,
}

impl ChargeEvent {
    pub fn classify(&self) -> ChargeAction {
        if self.data.object != "charge" {
            return ChargeAction::Ignore;
        }
        match self.key.as_str() {
            CHARGE_COMPLETE if self.data.paid && self.data.status == CHARGE_STATUS_SUCCESSFUL => ChargeAction::Settle,
            CHARGE_COMPLETE if self.data.status == CHARGE_STATUS_FAILED => ChargeAction::MarkFailed,
            CHARGE_COMPLETE if self.data.status == CHARGE_STATUS_EXPIRED => ChargeAction::MarkExpired,
            CHARGE_FAILED => ChargeAction::MarkFailed,
            CHARGE_EXPIRED => ChargeAction::MarkExpired,
            _ => ChargeAction::Ignore,
        }
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.data.metadata.order_id.as_deref().map(OrderId::from)
    }

    pub fn charge_id(&self) -> &str {
        &self.data.id
    }

    /// A human-readable reason for a failed or expired charge, for the order's failure bookkeeping.
    pub fn failure_reason(&self) -> Option<String> {
        match (&self.data.failure_code, &self.data.failure_message) {
            (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
            (Some(code), None) => Some(code.clone()),
            (None, Some(msg)) => Some(msg.clone()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn event(key: &str, status: &str, paid: bool) -> ChargeEvent {
        ChargeEvent {
            key: key.to_string(),
            data: ChargeObject {
                object: "charge".to_string(),
                id: "chrg_001".to_string(),
                status: status.to_string(),
                paid,
                failure_code: None,
                failure_message: None,
                metadata: ChargeMetadata { order_id: Some("o1".to_string()) },
            },
        }
    }

    #[test]
    fn successful_paid_charge_settles() {
        assert_eq!(event(CHARGE_COMPLETE, "successful", true).classify(), ChargeAction::Settle);
    }

    #[test]
    fn successful_but_unpaid_charge_is_ignored() {
        // `paid` is the authoritative flag; a "successful" status without it must not settle anything.
        assert_eq!(event(CHARGE_COMPLETE, "successful", false).classify(), ChargeAction::Ignore);
    }

    #[test]
    fn failed_charges_mark_failed() {
        assert_eq!(event(CHARGE_FAILED, "failed", false).classify(), ChargeAction::MarkFailed);
        assert_eq!(event(CHARGE_COMPLETE, "failed", false).classify(), ChargeAction::MarkFailed);
    }

    #[test]
    fn expired_charges_mark_expired() {
        assert_eq!(event(CHARGE_EXPIRED, "expired", false).classify(), ChargeAction::MarkExpired);
        assert_eq!(event(CHARGE_COMPLETE, "expired", false).classify(), ChargeAction::MarkExpired);
    }

    #[test]
    fn non_charge_objects_are_ignored() {
        let mut ev = event(CHARGE_COMPLETE, "successful", true);
        ev.data.object = "transfer".to_string();
        assert_eq!(ev.classify(), ChargeAction::Ignore);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert_eq!(event("charge.create", "pending", false).classify(), ChargeAction::Ignore);
        assert_eq!(event("refund.create", "successful", true).classify(), ChargeAction::Ignore);
    }

    #[test]
    fn metadata_accepts_both_casings() {
        let json = r#"{"key":"charge.complete","data":{"object":"charge","id":"chrg_1","status":"successful","paid":true,"metadata":{"orderId":"o42"}}}"#;
        let ev: ChargeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.order_id().unwrap().as_str(), "o42");
        let json = r#"{"key":"charge.complete","data":{"object":"charge","id":"chrg_1","status":"successful","paid":true,"metadata":{"order_id":"o43"}}}"#;
        let ev: ChargeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.order_id().unwrap().as_str(), "o43");
    }

    #[test]
    fn failure_reason_combines_code_and_message() {
        let mut ev = event(CHARGE_FAILED, "failed", false);
        ev.data.failure_code = Some("insufficient_fund".to_string());
        ev.data.failure_message = Some("Not enough balance".to_string());
        assert_eq!(ev.failure_reason().as_deref(), Some("insufficient_fund: Not enough balance"));
    }
}
