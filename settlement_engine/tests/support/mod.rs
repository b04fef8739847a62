pub mod payouts;
pub mod prepare_env;
pub mod seed;

use settlement_engine::charge_types::{ChargeEvent, ChargeMetadata, ChargeObject};

pub fn settle_event(order_id: &str, charge_id: &str) -> ChargeEvent {
    charge_event("charge.complete", "successful", true, order_id, charge_id)
}

pub fn failed_event(order_id: &str, charge_id: &str) -> ChargeEvent {
    let mut event = charge_event("charge.failed", "failed", false, order_id, charge_id);
    event.data.failure_code = Some("insufficient_fund".to_string());
    event.data.failure_message = Some("The payment source had insufficient funds".to_string());
    event
}

pub fn expired_event(order_id: &str, charge_id: &str) -> ChargeEvent {
    charge_event("charge.expired", "expired", false, order_id, charge_id)
}

pub fn charge_event(key: &str, status: &str, paid: bool, order_id: &str, charge_id: &str) -> ChargeEvent {
    ChargeEvent {
        key: key.to_string(),
        data: ChargeObject {
            object: "charge".to_string(),
            id: charge_id.to_string(),
            status: status.to_string(),
            paid,
            failure_code: None,
            failure_message: None,
            metadata: ChargeMetadata { order_id: Some(order_id.to_string()) },
        },
    }
}
