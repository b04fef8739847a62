use serde::{Deserialize, Serialize};

use crate::db_types::{InventoryDelta, Money, NewSettlementLine, Order, OrderId, OrderItem};

/// One consistent view of an order and everything settlement needs to know about it: line items grouped per
/// seller, the cart entries that produced it, and any linked sub-orders sharing the same payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAggregate {
    pub order: Order,
    pub seller_groups: Vec<SellerGroup>,
    pub cart_item_ids: Vec<String>,
    pub sub_order_ids: Vec<OrderId>,
}

/// One seller's slice of an order. The fee share is derived from the rate the checkout recorded on the order;
/// settlement never applies fee policy of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerGroup {
    pub shop_id: String,
    pub items: Vec<OrderItem>,
    pub gross: Money,
    pub platform_fee: Money,
}

impl SellerGroup {
    pub fn net(&self) -> Money {
        self.gross - self.platform_fee
    }
}

impl OrderAggregate {
    /// Groups the flat item list per shop, preserving the order in which shops first appear so that payout
    /// dispatch (and therefore the transfer error log) has a deterministic order.
    pub fn from_parts(
        order: Order,
        items: Vec<OrderItem>,
        cart_item_ids: Vec<String>,
        sub_order_ids: Vec<OrderId>,
    ) -> Self {
        let mut seller_groups: Vec<SellerGroup> = Vec::new();
        for item in items {
            match seller_groups.iter_mut().find(|g| g.shop_id == item.shop_id) {
                Some(group) => {
                    group.gross = group.gross + item.gross();
                    group.items.push(item);
                },
                None => seller_groups.push(SellerGroup {
                    shop_id: item.shop_id.clone(),
                    gross: item.gross(),
                    platform_fee: Money::from(0),
                    items: vec![item],
                }),
            }
        }
        for group in &mut seller_groups {
            group.platform_fee = group.gross.basis_points(order.fee_bps);
        }
        Self { order, seller_groups, cart_item_ids, sub_order_ids }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order.order_id
    }

    /// A cart checkout spans several sellers; a direct purchase has exactly one.
    pub fn is_multi_seller(&self) -> bool {
        self.seller_groups.len() > 1
    }

    /// The stock/sold-count adjustments for every purchased line item, across all sellers.
    pub fn inventory_deltas(&self) -> Vec<InventoryDelta> {
        self.seller_groups
            .iter()
            .flat_map(|g| g.items.iter())
            .map(|item| InventoryDelta { product_id: item.product_id.clone(), quantity: item.quantity })
            .collect()
    }

    /// The per-seller settlement lines: net payable = gross - fee, computed here exactly once. The store keys
    /// these unique per (order, shop) so re-computation on a replayed webhook is a no-op.
    pub fn settlement_lines(&self) -> Vec<NewSettlementLine> {
        self.seller_groups
            .iter()
            .map(|g| NewSettlementLine {
                order_id: self.order.order_id.clone(),
                shop_id: g.shop_id.clone(),
                gross: g.gross,
                platform_fee: g.platform_fee,
                net: g.net(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{FulfillmentStatus, PaymentStatus};

    fn order(total: i64, fee_bps: i64) -> Order {
        Order {
            id: 1,
            order_id: OrderId::from("o1"),
            buyer_id: "buyer1".to_string(),
            parent_order_id: None,
            total_amount: Money::from(total),
            platform_fee: Money::from(total).basis_points(fee_bps),
            fee_bps,
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

    fn item(id: i64, shop: &str, product: &str, qty: i64, price: i64) -> OrderItem {
        OrderItem {
            id,
            order_id: OrderId::from("o1"),
            shop_id: shop.to_string(),
            product_id: product.to_string(),
            quantity: qty,
            unit_price: Money::from(price),
        }
    }

    #[test]
    fn single_seller_split() {
        let items = vec![item(1, "s1", "p1", 1, 1000)];
        let agg = OrderAggregate::from_parts(order(1000, 1000), items, vec![], vec![]);
        assert!(!agg.is_multi_seller());
        assert_eq!(agg.seller_groups.len(), 1);
        let line = &agg.settlement_lines()[0];
        assert_eq!(line.gross, Money::from(1000));
        assert_eq!(line.platform_fee, Money::from(100));
        assert_eq!(line.net, Money::from(900));
    }

    #[test]
    fn multi_seller_split_sums_to_total() {
        let items = vec![item(1, "s1", "p1", 2, 300), item(2, "s2", "p2", 1, 400)];
        let agg = OrderAggregate::from_parts(order(1000, 1000), items, vec![], vec![]);
        assert!(agg.is_multi_seller());
        let lines = agg.settlement_lines();
        assert_eq!(lines[0].net, Money::from(540));
        assert_eq!(lines[1].net, Money::from(360));
        let total_net: Money = lines.iter().map(|l| l.net).sum();
        let total_fee: Money = lines.iter().map(|l| l.platform_fee).sum();
        assert_eq!(total_net + total_fee, agg.order.total_amount);
    }

    #[test]
    fn items_from_the_same_shop_are_grouped() {
        let items = vec![item(1, "s1", "p1", 1, 250), item(2, "s2", "p9", 1, 500), item(3, "s1", "p2", 1, 250)];
        let agg = OrderAggregate::from_parts(order(1000, 1000), items, vec![], vec![]);
        assert_eq!(agg.seller_groups.len(), 2);
        // first-seen order is preserved
        assert_eq!(agg.seller_groups[0].shop_id, "s1");
        assert_eq!(agg.seller_groups[0].items.len(), 2);
        assert_eq!(agg.seller_groups[0].gross, Money::from(500));
    }

    #[test]
    fn inventory_deltas_cover_every_item() {
        let items = vec![item(1, "s1", "p1", 2, 300), item(2, "s2", "p2", 1, 400)];
        let agg = OrderAggregate::from_parts(order(1000, 1000), items, vec![], vec![]);
        let deltas = agg.inventory_deltas();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].product_id, "p1");
        assert_eq!(deltas[0].quantity, 2);
        assert_eq!(deltas[1].product_id, "p2");
        assert_eq!(deltas[1].quantity, 1);
    }

    #[test]
    fn rounding_never_exceeds_the_order_total() {
        // 3 sellers, 999 satang each, 10% fee: each fee share truncates from 99.9 to 99
        let items = vec![item(1, "s1", "p1", 1, 999), item(2, "s2", "p2", 1, 999), item(3, "s3", "p3", 1, 999)];
        let agg = OrderAggregate::from_parts(order(2997, 1000), items, vec![], vec![]);
        let lines = agg.settlement_lines();
        let total_net: Money = lines.iter().map(|l| l.net).sum();
        let total_fee: Money = lines.iter().map(|l| l.platform_fee).sum();
        assert!(total_net + total_fee <= agg.order.total_amount);
        assert!((total_net + total_fee).value() > agg.order.total_amount.value() - 3);
    }
}
