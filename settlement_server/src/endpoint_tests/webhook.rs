use actix_web::http::StatusCode;
use hmac::{Hmac, Mac};
use mockall::predicate::eq;
use settlement_engine::{
    db_types::{Money, OrderId, PaymentStatus, PayoutStatus, SettlementLine},
    traits::{PayoutReceipt, SettlementError},
};
use sha2::Sha256;

use super::{
    helpers::{charge_body, configure, pending_order, post_webhook, settled_order, single_seller_aggregate},
    mocks::{MockPayouts, MockSettlementDb},
};
use crate::config::WebhookAuth;

const ACK: &str = r#"{"received":true}"#;

#[actix_web::test]
async fn non_charge_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    // no expectations: touching the store at all would fail the test
    let db = MockSettlementDb::new();
    let payouts = MockPayouts::new();
    let body = serde_json::json!({
        "key": "customer.update",
        "data": { "object": "customer", "id": "cust_1", "status": "active", "paid": false }
    })
    .to_string();
    let (status, body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn malformed_payloads_are_acknowledged_not_retried() {
    let _ = env_logger::try_init().ok();
    let db = MockSettlementDb::new();
    let payouts = MockPayouts::new();
    let (status, body) =
        post_webhook("this is not json".to_string(), None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn failed_charges_annul_the_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSettlementDb::new();
    db.expect_annul_order().times(1).returning(|order_id, status, _reason| {
        assert_eq!(status, PaymentStatus::Failed);
        let mut order = pending_order(order_id.as_str());
        order.payment_status = PaymentStatus::Failed;
        Ok(Some(order))
    });
    let payouts = MockPayouts::new();
    let body = charge_body("charge.failed", "failed", false, "o1");
    let (status, body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn successful_charge_runs_the_full_pipeline() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order_aggregate().times(1).returning(|order_id| Ok(single_seller_aggregate(order_id.as_str())));
    db.expect_settle_order()
        .times(1)
        .returning(|order_id, charge_id| Ok(Some(settled_order(order_id.as_str(), charge_id))));
    db.expect_step_completed().times(1).returning(|_, _| Ok(false));
    db.expect_adjust_for_sale().times(1).returning(|deltas| {
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].product_id, "p1");
        Ok(())
    });
    db.expect_record_step().times(1).returning(|_, _| Ok(()));
    db.expect_create_settlement_lines().times(1).returning(|aggregate| {
        let now = chrono::Utc::now();
        Ok(vec![SettlementLine {
            id: 11,
            order_id: aggregate.order.order_id.clone(),
            shop_id: "s1".to_string(),
            gross: Money::from(1000),
            platform_fee: Money::from(100),
            net: Money::from(900),
            payout_status: PayoutStatus::NotAttempted,
            transfer_id: None,
            created_at: now,
            updated_at: now,
        }])
    });
    db.expect_mark_payout_dispatched().times(1).with(eq(11i64), eq("trsf_1")).returning(|_, _| Ok(()));
    db.expect_set_payout_completed().times(1).returning(|_| Ok(()));
    db.expect_propagate_to_sub_orders().times(1).returning(|_| Ok(vec![]));
    db.expect_shop_owner().times(1).with(eq("s1")).returning(|_| Ok(Some("user_s1".to_string())));
    db.expect_notify().times(2).returning(|_| Ok(true));
    let mut payouts = MockPayouts::new();
    payouts.expect_dispatch().times(1).returning(|request| {
        assert_eq!(request.amount, Money::from(900));
        assert_eq!(request.shop_id, "s1");
        Ok(PayoutReceipt { transfer_id: "trsf_1".to_string(), status: "sent".to_string() })
    });

    let body = charge_body("charge.complete", "successful", true, "o1");
    let (status, body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn unknown_orders_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order_aggregate()
        .times(1)
        .returning(|order_id| Err(SettlementError::OrderNotFound(order_id.clone())));
    let payouts = MockPayouts::new();
    let body = charge_body("charge.complete", "successful", true, "ghost");
    let (status, body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

#[actix_web::test]
async fn storage_failures_surface_so_the_provider_redelivers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order_aggregate().times(1).returning(|order_id| Ok(single_seller_aggregate(order_id.as_str())));
    db.expect_settle_order()
        .times(1)
        .returning(|_, _| Err(SettlementError::DatabaseError("connection lost".to_string())));
    let payouts = MockPayouts::new();
    let body = charge_body("charge.complete", "successful", true, "o1");
    let (status, _body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn duplicate_deliveries_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockSettlementDb::new();
    db.expect_fetch_order_aggregate().times(1).returning(|order_id| Ok(single_seller_aggregate(order_id.as_str())));
    // the guard reports "not pending" and the pipeline stops there
    db.expect_settle_order().times(1).returning(|_, _| Ok(None));
    let payouts = MockPayouts::new();
    let body = charge_body("charge.complete", "successful", true, "o1");
    let (status, body) = post_webhook(body, None, configure(db, payouts, WebhookAuth::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

fn signed_auth() -> WebhookAuth {
    WebhookAuth { hmac_checks: true, hmac_secret: marketplace_common::Secret::new("whsec_test".to_string()) }
}

fn sign(secret: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body.as_bytes());
    base64::encode(mac.finalize().into_bytes())
}

#[actix_web::test]
async fn webhook_signature_is_enforced_when_enabled() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({
        "key": "customer.update",
        "data": { "object": "customer", "id": "cust_1", "status": "active", "paid": false }
    })
    .to_string();

    let db = MockSettlementDb::new();
    let payouts = MockPayouts::new();
    let (status, _body) = post_webhook(body.clone(), None, configure(db, payouts, signed_auth())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let db = MockSettlementDb::new();
    let payouts = MockPayouts::new();
    let signature = sign("whsec_test", &body);
    let (status, response) =
        post_webhook(body, Some(signature.as_str()), configure(db, payouts, signed_auth())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, ACK);
}
