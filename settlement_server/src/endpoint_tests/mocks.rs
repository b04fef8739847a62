use mockall::mock;
use settlement_engine::{
    db_types::{
        CartItem,
        InventoryDelta,
        NewNotification,
        Notification,
        Order,
        OrderId,
        OrderItem,
        PaymentStatus,
        Product,
        SettlementLine,
        SettlementStep,
        TransferErrorRecord,
    },
    traits::{
        CartError,
        CartManagement,
        InventoryError,
        InventoryManagement,
        NotificationError,
        NotificationManagement,
        OrderManagement,
        OrderQueryError,
        PayoutProvider,
        PayoutProviderError,
        PayoutReceipt,
        PayoutRequest,
        SettlementDatabase,
        SettlementError,
    },
    OrderAggregate,
};

mock! {
    pub SettlementDb {}
    impl SettlementDatabase for SettlementDb {
        fn url(&self) -> &str;
        async fn fetch_order_aggregate(&self, order_id: &OrderId) -> Result<OrderAggregate, SettlementError>;
        async fn settle_order(&self, order_id: &OrderId, charge_id: &str) -> Result<Option<Order>, SettlementError>;
        async fn annul_order(&self, order_id: &OrderId, status: PaymentStatus, reason: Option<String>) -> Result<Option<Order>, SettlementError>;
        async fn create_settlement_lines(&self, aggregate: &OrderAggregate) -> Result<Vec<SettlementLine>, SettlementError>;
        async fn mark_payout_dispatched(&self, line_id: i64, transfer_id: &str) -> Result<(), SettlementError>;
        async fn mark_payout_failed(&self, line: &SettlementLine, message: &str) -> Result<(), SettlementError>;
        async fn set_payout_completed(&self, order_id: &OrderId) -> Result<(), SettlementError>;
        async fn propagate_to_sub_orders(&self, parent: &Order) -> Result<Vec<Order>, SettlementError>;
        async fn step_completed(&self, order_id: &OrderId, step: SettlementStep) -> Result<bool, SettlementError>;
        async fn record_step(&self, order_id: &OrderId, step: SettlementStep) -> Result<(), SettlementError>;
        async fn close(&mut self) -> Result<(), SettlementError>;
    }
    impl OrderManagement for SettlementDb {
        async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderQueryError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderQueryError>;
        async fn fetch_settlement_lines(&self, order_id: &OrderId) -> Result<Vec<SettlementLine>, OrderQueryError>;
        async fn fetch_transfer_errors(&self, order_id: &OrderId) -> Result<Vec<TransferErrorRecord>, OrderQueryError>;
        async fn fetch_notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>, OrderQueryError>;
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderQueryError>;
        async fn fetch_cart_items(&self, buyer_id: &str) -> Result<Vec<CartItem>, OrderQueryError>;
    }
    impl InventoryManagement for SettlementDb {
        async fn adjust_for_sale(&self, deltas: &[InventoryDelta]) -> Result<(), InventoryError>;
    }
    impl CartManagement for SettlementDb {
        async fn remove_cart_items(&self, buyer_id: &str, item_ids: &[String]) -> Result<u64, CartError>;
    }
    impl NotificationManagement for SettlementDb {
        async fn notify(&self, notification: NewNotification) -> Result<bool, NotificationError>;
        async fn shop_owner(&self, shop_id: &str) -> Result<Option<String>, NotificationError>;
    }
    impl Clone for SettlementDb {
        fn clone(&self) -> Self;
    }
}

mock! {
    pub Payouts {}
    impl PayoutProvider for Payouts {
        async fn dispatch(&self, request: &PayoutRequest) -> Result<PayoutReceipt, PayoutProviderError>;
    }
    impl Clone for Payouts {
        fn clone(&self) -> Self;
    }
}
