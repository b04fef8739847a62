use actix_web::{http::StatusCode, test, web, web::ServiceConfig, App};
use chrono::Utc;
use settlement_engine::{
    db_types::{FulfillmentStatus, Money, Order, OrderId, OrderItem, PaymentStatus},
    events::EventProducers,
    OrderAggregate,
    SettlementFlowApi,
};

use super::mocks::{MockPayouts, MockSettlementDb};
use crate::{
    config::{ProxyConfig, WebhookAuth},
    routes::ChargeWebhookRoute,
};

pub fn configure(
    db: MockSettlementDb,
    payouts: MockPayouts,
    auth: WebhookAuth,
) -> impl FnOnce(&mut ServiceConfig) {
    let api = SettlementFlowApi::new(db, payouts, EventProducers::default());
    move |cfg: &mut ServiceConfig| {
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(auth))
            .app_data(web::Data::new(ProxyConfig::default()))
            .service(ChargeWebhookRoute::<MockSettlementDb, MockPayouts>::new());
    }
}

pub async fn post_webhook<F>(body: String, signature: Option<&str>, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    let mut req = test::TestRequest::post()
        .uri("/webhook/charge")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    if let Some(sig) = signature {
        req = req.insert_header(("X-Signature", sig));
    }
    let res = test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

pub fn pending_order(order_id: &str) -> Order {
    Order {
        id: 1,
        order_id: OrderId::from(order_id),
        buyer_id: "buyer1".to_string(),
        parent_order_id: None,
        total_amount: Money::from(1000),
        platform_fee: Money::from(100),
        fee_bps: 1000,
        payment_status: PaymentStatus::Pending,
        fulfillment_status: FulfillmentStatus::Pending,
        charge_id: None,
        failure_reason: None,
        payout_completed: false,
        paid_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn settled_order(order_id: &str, charge_id: &str) -> Order {
    let mut order = pending_order(order_id);
    order.payment_status = PaymentStatus::Completed;
    order.fulfillment_status = FulfillmentStatus::Processing;
    order.charge_id = Some(charge_id.to_string());
    order.paid_at = Some(Utc::now());
    order
}

pub fn single_seller_aggregate(order_id: &str) -> OrderAggregate {
    let item = OrderItem {
        id: 1,
        order_id: OrderId::from(order_id),
        shop_id: "s1".to_string(),
        product_id: "p1".to_string(),
        quantity: 1,
        unit_price: Money::from(1000),
    };
    OrderAggregate::from_parts(pending_order(order_id), vec![item], vec![], vec![])
}

pub fn charge_body(key: &str, status: &str, paid: bool, order_id: &str) -> String {
    serde_json::json!({
        "key": key,
        "data": {
            "object": "charge",
            "id": "chrg_test_1",
            "status": status,
            "paid": paid,
            "metadata": { "orderId": order_id }
        }
    })
    .to_string()
}
