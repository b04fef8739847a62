use std::fmt::Debug;

use log::*;

use crate::{
    charge_types::{ChargeAction, ChargeEvent},
    db_types::{
        NewNotification,
        NotificationKind,
        Order,
        OrderId,
        PaymentStatus,
        PayoutStatus,
        SettlementLine,
        SettlementStep,
    },
    events::{EventProducers, OrderAnnulledEvent, OrderSettledEvent, PayoutFailedEvent},
    settlement_api::OrderAggregate,
    traits::{PayoutProvider, PayoutRequest, SettlementBackend, SettlementError},
};

/// `SettlementFlowApi` is the primary API for settling orders in response to payment-provider charge events.
///
/// One call to [`Self::process_charge_event`] handles one webhook delivery end to end. The transition into
/// `Completed` is a conditional write, so replays and out-of-order deliveries fall out of the pipeline at the
/// guard; the downstream steps (inventory, payouts, fan-out) each fail in isolation and never undo the payment
/// confirmation.
pub struct SettlementFlowApi<B, P> {
    db: B,
    payouts: P,
    producers: EventProducers,
}

impl<B, P> Debug for SettlementFlowApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementFlowApi")
    }
}

impl<B, P> SettlementFlowApi<B, P> {
    pub fn new(db: B, payouts: P, producers: EventProducers) -> Self {
        Self { db, payouts, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

/// What one webhook delivery amounted to. Every variant is an acknowledgement; only an `Err` from the pipeline
/// should make the transport report a failure to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Not a charge, an unrecognised event, or a payload without an order reference. Nothing happened.
    Ignored,
    /// The full settlement pipeline ran for this order.
    Settled(Box<Order>),
    /// The idempotency guard found the order already settled (or otherwise terminal); nothing happened.
    AlreadySettled(OrderId),
    /// A failure or expiry event moved the order into a terminal non-paid state.
    Annulled(Box<Order>),
    /// A failure or expiry event arrived for an order that is not pending; nothing happened.
    Unchanged(OrderId),
}

impl<B, P> SettlementFlowApi<B, P>
where
    B: SettlementBackend,
    P: PayoutProvider,
{
    /// Handles one charge event delivery.
    ///
    /// Errors returned from here are "fatal for this delivery" only: every mutation behind them is guarded, so the
    /// provider redelivering the event is always safe.
    pub async fn process_charge_event(&self, event: &ChargeEvent) -> Result<SettlementOutcome, SettlementError> {
        let action = event.classify();
        trace!("🔄️ Charge event [{}] classified as {action:?}", event.charge_id());
        let order_id = match event.order_id() {
            Some(id) => id,
            None => {
                if action != ChargeAction::Ignore {
                    warn!("🔄️ Charge event [{}] carries no order reference. Nothing to do.", event.charge_id());
                }
                return Ok(SettlementOutcome::Ignored);
            },
        };
        match action {
            ChargeAction::Ignore => Ok(SettlementOutcome::Ignored),
            ChargeAction::MarkFailed => self.annul(&order_id, PaymentStatus::Failed, event.failure_reason()).await,
            ChargeAction::MarkExpired => self.annul(&order_id, PaymentStatus::Expired, event.failure_reason()).await,
            ChargeAction::Settle => self.settle(&order_id, event.charge_id()).await,
        }
    }

    /// The success path: guard, then inventory, payouts and fan-out as individually-failable steps.
    async fn settle(&self, order_id: &OrderId, charge_id: &str) -> Result<SettlementOutcome, SettlementError> {
        let aggregate = self.db.fetch_order_aggregate(order_id).await?;
        let order = match self.db.settle_order(order_id, charge_id).await? {
            Some(order) => order,
            None => {
                // The single authoritative duplicate-suppression point. Everything below may assume it runs at
                // most once per order.
                info!("🔄️ Order {order_id} is already settled. Acknowledging and taking no further action.");
                return Ok(SettlementOutcome::AlreadySettled(order_id.clone()));
            },
        };
        debug!("🔄️ Order {order_id} confirmed as paid via charge [{charge_id}]");

        self.adjust_inventory(&aggregate).await?;
        self.dispatch_payouts(&aggregate).await?;
        self.clean_cart(&aggregate).await?;
        let sub_orders = self.db.propagate_to_sub_orders(&order).await?;
        if !sub_orders.is_empty() {
            debug!("🔄️ {} sub-orders of {order_id} marked as paid", sub_orders.len());
        }
        self.send_notifications(&aggregate).await?;

        self.call_order_settled_hook(&order).await;
        info!("🔄️ Settlement of order {order_id} complete.");
        Ok(SettlementOutcome::Settled(Box::new(order)))
    }

    /// Stock drift is preferable to blocking payment confirmation, so a failed batch is logged and swallowed. The
    /// step marker keeps the batch at-most-once if a crashed delivery is ever re-run.
    async fn adjust_inventory(&self, aggregate: &OrderAggregate) -> Result<(), SettlementError> {
        let order_id = aggregate.order_id();
        if self.db.step_completed(order_id, SettlementStep::InventoryAdjusted).await? {
            debug!("🔄️ Inventory for order {order_id} was already adjusted. Skipping.");
            return Ok(());
        }
        let deltas = aggregate.inventory_deltas();
        match self.db.adjust_for_sale(&deltas).await {
            Ok(()) => {
                self.db.record_step(order_id, SettlementStep::InventoryAdjusted).await?;
                debug!("🔄️ Adjusted stock for {} products on order {order_id}", deltas.len());
            },
            Err(e) => {
                error!("🔄️ Inventory adjustment for order {order_id} failed. Settlement continues. {e}");
            },
        }
        Ok(())
    }

    /// Computes the per-seller split and dispatches transfers sequentially. One seller's failure is recorded and
    /// never interferes with the others; afterwards the order is flagged as payout-attempted for all sellers.
    async fn dispatch_payouts(&self, aggregate: &OrderAggregate) -> Result<(), SettlementError> {
        let order_id = aggregate.order_id();
        let lines = self.db.create_settlement_lines(aggregate).await?;
        for line in lines.iter().filter(|l| l.payout_status == PayoutStatus::NotAttempted) {
            self.dispatch_one(order_id, line).await?;
        }
        self.db.set_payout_completed(order_id).await?;
        Ok(())
    }

    async fn dispatch_one(&self, order_id: &OrderId, line: &SettlementLine) -> Result<(), SettlementError> {
        let request = PayoutRequest::new(line.shop_id.clone(), line.net, order_id.clone());
        match self.payouts.dispatch(&request).await {
            Ok(receipt) => {
                self.db.mark_payout_dispatched(line.id, &receipt.transfer_id).await?;
                debug!(
                    "💸️ Dispatched {} to shop {} for order {order_id} (transfer [{}])",
                    line.net, line.shop_id, receipt.transfer_id
                );
            },
            Err(e) => {
                error!("💸️ Payout of {} to shop {} for order {order_id} failed. {e}", line.net, line.shop_id);
                self.db.mark_payout_failed(line, &e.to_string()).await?;
                self.call_payout_failed_hook(PayoutFailedEvent {
                    order_id: order_id.clone(),
                    shop_id: line.shop_id.clone(),
                    amount: line.net,
                    message: e.to_string(),
                })
                .await;
            },
        }
        Ok(())
    }

    /// A stale cart is an annoyance, not a fault; failures here are logged and swallowed.
    async fn clean_cart(&self, aggregate: &OrderAggregate) -> Result<(), SettlementError> {
        let order_id = aggregate.order_id();
        if aggregate.cart_item_ids.is_empty() {
            return Ok(());
        }
        if self.db.step_completed(order_id, SettlementStep::CartCleared).await? {
            debug!("🔄️ Cart for order {order_id} was already cleaned. Skipping.");
            return Ok(());
        }
        match self.db.remove_cart_items(&aggregate.order.buyer_id, &aggregate.cart_item_ids).await {
            Ok(n) => {
                self.db.record_step(order_id, SettlementStep::CartCleared).await?;
                debug!("🔄️ Removed {n} cart entries for buyer {}", aggregate.order.buyer_id);
            },
            Err(e) => {
                warn!("🔄️ Cart cleanup for order {order_id} failed. The buyer may see stale cart entries. {e}");
            },
        }
        Ok(())
    }

    /// One buyer notice and one per distinct shop. The store suppresses duplicates per (order, recipient, kind),
    /// so a replayed delivery cannot double-notify; individual send failures are logged and swallowed.
    async fn send_notifications(&self, aggregate: &OrderAggregate) -> Result<(), SettlementError> {
        let order = &aggregate.order;
        let buyer_notice = NewNotification {
            order_id: order.order_id.clone(),
            user_id: order.buyer_id.clone(),
            kind: NotificationKind::PaymentReceived,
            title: "Payment received".to_string(),
            body: format!("Your payment of {} for order {} has been received.", order.total_amount, order.order_id),
            link: format!("/orders/{}", order.order_id.as_str()),
            data: None,
        };
        self.send_one(buyer_notice).await;
        for group in &aggregate.seller_groups {
            let owner = match self.db.shop_owner(&group.shop_id).await {
                Ok(Some(owner)) => owner,
                Ok(None) => {
                    warn!("🔄️ Shop {} has no owner on record; seller notice skipped.", group.shop_id);
                    continue;
                },
                Err(e) => {
                    warn!("🔄️ Could not resolve the owner of shop {}. Seller notice skipped. {e}", group.shop_id);
                    continue;
                },
            };
            let seller_notice = NewNotification {
                order_id: order.order_id.clone(),
                user_id: owner,
                kind: NotificationKind::NewOrder,
                title: "New order".to_string(),
                body: format!("You have a new order {} worth {}.", order.order_id, group.gross),
                link: format!("/shops/{}/orders/{}", group.shop_id, order.order_id.as_str()),
                data: None,
            };
            self.send_one(seller_notice).await;
        }
        Ok(())
    }

    async fn send_one(&self, notification: NewNotification) {
        let user_id = notification.user_id.clone();
        match self.db.notify(notification).await {
            Ok(true) => trace!("🔄️ Notified user {user_id}"),
            Ok(false) => debug!("🔄️ User {user_id} was already notified. Skipping."),
            Err(e) => warn!("🔄️ Could not notify user {user_id}. {e}"),
        }
    }

    /// The failure path: a conditional transition that a completed order simply ignores, however late or
    /// out-of-order the event arrives.
    async fn annul(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
        reason: Option<String>,
    ) -> Result<SettlementOutcome, SettlementError> {
        match self.db.annul_order(order_id, status, reason).await? {
            Some(order) => {
                info!("🔄️ Order {order_id} marked as {status}");
                self.call_order_annulled_hook(&order).await;
                Ok(SettlementOutcome::Annulled(Box::new(order)))
            },
            None => {
                debug!("🔄️ Order {order_id} is not pending; {status} event changes nothing.");
                Ok(SettlementOutcome::Unchanged(order_id.clone()))
            },
        }
    }

    async fn call_order_settled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_settled_producer {
            trace!("🔄️ Notifying order settled hook subscribers");
            let event = OrderSettledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️ Notifying order annulled hook subscribers");
            let event = OrderAnnulledEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_payout_failed_hook(&self, event: PayoutFailedEvent) {
        for emitter in &self.producers.payout_failed_producer {
            trace!("💸️ Notifying payout failed hook subscribers");
            emitter.publish_event(event.clone()).await;
        }
    }
}
