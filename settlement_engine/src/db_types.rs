use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use marketplace_common::Money;

//--------------------------------------        OrderId        ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status value: {0}")]
pub struct ConversionError(String);

//--------------------------------------    PaymentStatus      ------------------------------------------------------
/// The payment leg of an order's lifecycle. `Pending` is the only non-terminal state: an order moves to exactly one
/// of `Completed`, `Failed` or `Expired` and stays there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Expired,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------  FulfillmentStatus    ------------------------------------------------------
/// The goods leg of an order's lifecycle. Only advances once the payment status is `Completed`; settlement moves it
/// from `Pending` to `Processing`, later stages (delivery, returns) are handled elsewhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum FulfillmentStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Pending => write!(f, "Pending"),
            FulfillmentStatus::Processing => write!(f, "Processing"),
            FulfillmentStatus::Completed => write!(f, "Completed"),
            FulfillmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for FulfillmentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid fulfillment status: {s}"))),
        }
    }
}

impl From<String> for FulfillmentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid fulfillment status: {value}. But this conversion cannot fail. Defaulting to Pending");
            FulfillmentStatus::Pending
        })
    }
}

//--------------------------------------     PayoutStatus      ------------------------------------------------------
/// Dispatch state of one seller's settlement line. A line is only ever dispatched from `NotAttempted`; `Failed`
/// lines wait for manual reconciliation via the transfer error log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PayoutStatus {
    #[default]
    NotAttempted,
    Dispatched,
    Failed,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::NotAttempted => write!(f, "NotAttempted"),
            PayoutStatus::Dispatched => write!(f, "Dispatched"),
            PayoutStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NotAttempted" => Ok(Self::NotAttempted),
            "Dispatched" => Ok(Self::Dispatched),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payout status: {s}"))),
        }
    }
}

impl From<String> for PayoutStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payout status: {value}. But this conversion cannot fail. Defaulting to NotAttempted");
            PayoutStatus::NotAttempted
        })
    }
}

//--------------------------------------        Order          ------------------------------------------------------
/// One buyer transaction. A cart checkout spans multiple sellers; a direct purchase has a single seller. Orders
/// sharing one payment are linked through `parent_order_id`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: String,
    pub parent_order_id: Option<OrderId>,
    pub total_amount: Money,
    /// Total platform fee for the order, fixed at checkout time.
    pub platform_fee: Money,
    /// The fee rate applied at checkout, in basis points. Settlement reads this; it never recomputes fee policy.
    pub fee_bps: i64,
    pub payment_status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub charge_id: Option<String>,
    pub failure_reason: Option<String>,
    pub payout_completed: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub shop_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn gross(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------   SettlementLine      ------------------------------------------------------
/// One seller's share of a settled order. `net` is computed exactly once, when the order's payment completes, and
/// is immutable afterwards; only the payout dispatch fields change.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SettlementLine {
    pub id: i64,
    pub order_id: OrderId,
    pub shop_id: String,
    pub gross: Money,
    pub platform_fee: Money,
    pub net: Money,
    pub payout_status: PayoutStatus,
    pub transfer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSettlementLine {
    pub order_id: OrderId,
    pub shop_id: String,
    pub gross: Money,
    pub platform_fee: Money,
    pub net: Money,
}

//-------------------------------------- TransferErrorRecord   ------------------------------------------------------
/// Append-only audit entry for a failed payout attempt. Never mutated or deleted by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TransferErrorRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub shop_id: String,
    pub amount: Money,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   InventoryDelta      ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDelta {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_id: String,
    pub shop_id: String,
    pub name: String,
    pub stock: i64,
    pub sold: i64,
}

//--------------------------------------      CartItem         ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub buyer_id: String,
    pub product_id: String,
    pub quantity: i64,
}

//--------------------------------------        Shop           ------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Shop {
    pub shop_id: String,
    pub owner_id: String,
    pub name: String,
}

//--------------------------------------   Notifications       ------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum NotificationKind {
    PaymentReceived,
    NewOrder,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::PaymentReceived => write!(f, "PaymentReceived"),
            NotificationKind::NewOrder => write!(f, "NewOrder"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PaymentReceived" => Ok(Self::PaymentReceived),
            "NewOrder" => Ok(Self::NewOrder),
            s => Err(ConversionError(format!("Invalid notification kind: {s}"))),
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid notification kind: {value}. But this conversion cannot fail. Defaulting to NewOrder");
            NotificationKind::NewOrder
        })
    }
}

/// An outbound message to a buyer or seller describing a settlement outcome. At most one notification exists per
/// (order, recipient, kind); replays are suppressed at insert time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: String,
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub order_id: OrderId,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub link: String,
    pub data: Option<String>,
}

//--------------------------------------   SettlementStep      ------------------------------------------------------
/// Durable per-order completion markers for downstream steps that are not naturally idempotent. A redelivered event
/// that passes the payment-status guard (e.g. after a crash mid-pipeline) checks these before re-applying a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStep {
    InventoryAdjusted,
    CartCleared,
}

impl Display for SettlementStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStep::InventoryAdjusted => write!(f, "inventory_adjusted"),
            SettlementStep::CartCleared => write!(f, "cart_cleared"),
        }
    }
}
