//! End-to-end settlement pipeline tests against a real SQLite store.
use log::*;
use settlement_engine::{
    db_types::{FulfillmentStatus, Money, NotificationKind, OrderId, PaymentStatus, PayoutStatus},
    events::EventProducers,
    traits::{OrderManagement, SettlementDatabase, SettlementError},
    SettlementFlowApi,
    SettlementOutcome,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::support::{
    expired_event,
    failed_event,
    payouts::TestPayouts,
    prepare_env::{prepare_test_env, random_db_path},
    seed,
    settle_event,
};

mod support;

async fn setup() -> (SettlementFlowApi<SqliteDatabase, TestPayouts>, SqliteDatabase, TestPayouts) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let payouts = TestPayouts::new();
    let api = SettlementFlowApi::new(db.clone(), payouts.clone(), EventProducers::default());
    (api, db, payouts)
}

async fn tear_down(api: SettlementFlowApi<SqliteDatabase, TestPayouts>) {
    let mut api = api;
    let url = api.db().url().to_string();
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.unwrap();
}

/// Order `o1`: one seller, gross 1000, 10% platform fee. The seller receives 900, stock moves by the purchased
/// quantity, and both parties are notified.
#[tokio::test]
async fn single_seller_settlement() {
    let (api, db, payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_product(&db, "p1", "s1", 5).await;
    seed::seed_order(&db, "o1", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o1", "s1", "p1", 1, 1000).await;

    let outcome = api.process_charge_event(&settle_event("o1", "chrg_o1")).await.expect("Error settling order");
    let order = match outcome {
        SettlementOutcome::Settled(order) => *order,
        other => panic!("Expected a settled order, got {other:?}"),
    };
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);
    assert_eq!(order.charge_id.as_deref(), Some("chrg_o1"));
    assert!(order.paid_at.is_some());

    let items = db.fetch_order_items(&OrderId::from("o1")).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].gross(), Money::from(1000));

    let lines = db.fetch_settlement_lines(&OrderId::from("o1")).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].gross, Money::from(1000));
    assert_eq!(lines[0].net, Money::from(900));
    assert_eq!(lines[0].payout_status, PayoutStatus::Dispatched);
    assert!(lines[0].transfer_id.is_some());

    let calls = payouts.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].shop_id, "s1");
    assert_eq!(calls[0].amount, Money::from(900));

    let product = db.fetch_product("p1").await.unwrap().unwrap();
    assert_eq!(product.stock, 4);
    assert_eq!(product.sold, 1);

    let settled = db.fetch_order(&OrderId::from("o1")).await.unwrap().unwrap();
    assert!(settled.payout_completed);

    let buyer_notices = db.fetch_notifications_for_user("buyer1").await.unwrap();
    assert_eq!(buyer_notices.len(), 1);
    assert_eq!(buyer_notices[0].kind, NotificationKind::PaymentReceived);
    let seller_notices = db.fetch_notifications_for_user("user_s1").await.unwrap();
    assert_eq!(seller_notices.len(), 1);
    assert_eq!(seller_notices[0].kind, NotificationKind::NewOrder);

    tear_down(api).await;
}

/// Order `o2`: sellers s1 (600) and s2 (400) at 10% fee. s2's dispatch fails; s1 still gets 540, a transfer error
/// for 360 is recorded, and the payment confirmation stands.
#[tokio::test]
async fn multi_seller_payout_isolation() {
    let (api, db, payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_shop(&db, "s2", "user_s2").await;
    seed::seed_product(&db, "p1", "s1", 10).await;
    seed::seed_product(&db, "p2", "s2", 10).await;
    seed::seed_order(&db, "o2", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o2", "s1", "p1", 1, 600).await;
    seed::seed_order_item(&db, "o2", "s2", "p2", 1, 400).await;
    payouts.fail_for("s2");

    let outcome = api.process_charge_event(&settle_event("o2", "chrg_o2")).await.expect("Error settling order");
    assert!(matches!(outcome, SettlementOutcome::Settled(_)));

    let lines = db.fetch_settlement_lines(&OrderId::from("o2")).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].shop_id, "s1");
    assert_eq!(lines[0].net, Money::from(540));
    assert_eq!(lines[0].payout_status, PayoutStatus::Dispatched);
    assert!(lines[0].transfer_id.is_some());
    assert_eq!(lines[1].shop_id, "s2");
    assert_eq!(lines[1].net, Money::from(360));
    assert_eq!(lines[1].payout_status, PayoutStatus::Failed);
    assert!(lines[1].transfer_id.is_none());

    let errors = db.fetch_transfer_errors(&OrderId::from("o2")).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].shop_id, "s2");
    assert_eq!(errors[0].amount, Money::from(360));

    // One seller's failure must never revert the payment confirmation, and payout counts as attempted for all.
    let order = db.fetch_order(&OrderId::from("o2")).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    assert!(order.payout_completed);

    tear_down(api).await;
}

/// Order `o3`: the same completed event is delivered twice. Inventory moves once, each recipient is notified once,
/// and each seller sees exactly one dispatch attempt.
#[tokio::test]
async fn duplicate_delivery_settles_once() {
    let (api, db, payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_product(&db, "p1", "s1", 5).await;
    seed::seed_order(&db, "o3", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o3", "s1", "p1", 2, 500).await;

    let event = settle_event("o3", "chrg_o3");
    let first = api.process_charge_event(&event).await.expect("Error settling order");
    assert!(matches!(first, SettlementOutcome::Settled(_)));
    let second = api.process_charge_event(&event).await.expect("Error processing duplicate");
    assert_eq!(second, SettlementOutcome::AlreadySettled(OrderId::from("o3")));

    let product = db.fetch_product("p1").await.unwrap().unwrap();
    assert_eq!(product.stock, 3);
    assert_eq!(product.sold, 2);
    assert_eq!(payouts.calls().len(), 1);
    assert_eq!(db.fetch_notifications_for_user("buyer1").await.unwrap().len(), 1);
    assert_eq!(db.fetch_notifications_for_user("user_s1").await.unwrap().len(), 1);

    tear_down(api).await;
}

/// Order `o4`: an expiry event that arrives after settlement must not touch the completed payment status.
#[tokio::test]
async fn expiry_after_completion_changes_nothing() {
    let (api, db, _payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_product(&db, "p1", "s1", 5).await;
    seed::seed_order(&db, "o4", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o4", "s1", "p1", 1, 1000).await;

    let settled = api.process_charge_event(&settle_event("o4", "chrg_o4")).await.unwrap();
    assert!(matches!(settled, SettlementOutcome::Settled(_)));
    let outcome = api.process_charge_event(&expired_event("o4", "chrg_o4")).await.unwrap();
    assert_eq!(outcome, SettlementOutcome::Unchanged(OrderId::from("o4")));

    let order = db.fetch_order(&OrderId::from("o4")).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Completed);

    tear_down(api).await;
}

#[tokio::test]
async fn failed_charge_annuls_a_pending_order() {
    let (api, db, payouts) = setup().await;
    seed::seed_order(&db, "o5", "buyer1", 1000, 1000).await;

    let outcome = api.process_charge_event(&failed_event("o5", "chrg_o5")).await.unwrap();
    let order = match outcome {
        SettlementOutcome::Annulled(order) => *order,
        other => panic!("Expected an annulled order, got {other:?}"),
    };
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(
        order.failure_reason.as_deref(),
        Some("insufficient_fund: The payment source had insufficient funds")
    );
    // a failure event never dispatches anything
    assert!(payouts.calls().is_empty());

    tear_down(api).await;
}

#[tokio::test]
async fn cart_entries_are_removed_after_settlement() {
    let (api, db, _payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_product(&db, "p1", "s1", 5).await;
    seed::seed_cart_item(&db, "cart_1", "buyer1", "p1").await;
    seed::seed_cart_item(&db, "cart_2", "buyer1", "p9").await;
    seed::seed_order(&db, "o6", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o6", "s1", "p1", 1, 1000).await;
    seed::seed_order_cart_ref(&db, "o6", "cart_1").await;

    let outcome = api.process_charge_event(&settle_event("o6", "chrg_o6")).await.unwrap();
    assert!(matches!(outcome, SettlementOutcome::Settled(_)));

    // only the entry that produced the order is removed
    let remaining = db.fetch_cart_items("buyer1").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "cart_2");

    tear_down(api).await;
}

#[tokio::test]
async fn sub_orders_share_the_settlement() {
    let (api, db, _payouts) = setup().await;
    seed::seed_shop(&db, "s1", "user_s1").await;
    seed::seed_shop(&db, "s2", "user_s2").await;
    seed::seed_product(&db, "p1", "s1", 5).await;
    seed::seed_order(&db, "o7", "buyer1", 1000, 1000).await;
    seed::seed_order_item(&db, "o7", "s1", "p1", 1, 1000).await;
    seed::seed_sub_order(&db, "o7-a", "buyer1", 400, 1000, Some("o7")).await;
    seed::seed_sub_order(&db, "o7-b", "buyer1", 600, 1000, Some("o7")).await;

    let outcome = api.process_charge_event(&settle_event("o7", "chrg_o7")).await.unwrap();
    assert!(matches!(outcome, SettlementOutcome::Settled(_)));

    let parent = db.fetch_order(&OrderId::from("o7")).await.unwrap().unwrap();
    for sub_id in ["o7-a", "o7-b"] {
        let sub = db.fetch_order(&OrderId::from(sub_id)).await.unwrap().unwrap();
        assert_eq!(sub.payment_status, PaymentStatus::Completed);
        assert_eq!(sub.fulfillment_status, FulfillmentStatus::Processing);
        assert_eq!(sub.charge_id, parent.charge_id);
        assert_eq!(sub.paid_at, parent.paid_at);
    }

    tear_down(api).await;
}

#[tokio::test]
async fn unknown_orders_are_not_retryable() {
    let (api, _db, _payouts) = setup().await;
    let err = api.process_charge_event(&settle_event("no_such_order", "chrg_x")).await.unwrap_err();
    assert!(matches!(err, SettlementError::OrderNotFound(_)));
    tear_down(api).await;
}

#[tokio::test]
async fn unrecognised_events_are_acknowledged_without_changes() {
    let (api, db, payouts) = setup().await;
    seed::seed_order(&db, "o8", "buyer1", 1000, 1000).await;

    let event = support::charge_event("charge.create", "pending", false, "o8", "chrg_o8");
    let outcome = api.process_charge_event(&event).await.unwrap();
    assert_eq!(outcome, SettlementOutcome::Ignored);

    let order = db.fetch_order(&OrderId::from("o8")).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(payouts.calls().is_empty());

    tear_down(api).await;
}
