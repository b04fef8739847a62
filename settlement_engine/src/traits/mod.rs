//! # Collaborator contracts for the settlement pipeline.
//!
//! The pipeline never talks to storage or the payment provider directly; every side effect goes through one of the
//! traits in this module. Backends implement the storage traits (the bundled [`crate::SqliteDatabase`] implements
//! all of them on one pool), and the payout capability is a separate, network-facing trait so that tests can script
//! per-seller outcomes.
//!
//! * [`SettlementDatabase`] is the order store: aggregate loads, the conditional payment-status transitions that
//!   implement the idempotency guard, settlement-line bookkeeping and step markers.
//! * [`OrderManagement`] is the read side used by tests and operational tooling.
//! * [`InventoryManagement`], [`CartManagement`] and [`NotificationManagement`] cover the fan-out collaborators.
//! * [`PayoutProvider`] is the external "create transfer" capability.
mod cart_management;
mod inventory_management;
mod notification_management;
mod order_management;
mod payout_provider;
mod settlement_database;

pub use cart_management::{CartError, CartManagement};
pub use inventory_management::{InventoryError, InventoryManagement};
pub use notification_management::{NotificationError, NotificationManagement};
pub use order_management::{OrderManagement, OrderQueryError};
pub use payout_provider::{PayoutProvider, PayoutProviderError, PayoutReceipt, PayoutRequest};
pub use settlement_database::{SettlementDatabase, SettlementError};

/// Everything the settlement pipeline needs from one storage backend, as a single bound. Implemented for free by
/// any type that implements the individual traits.
pub trait SettlementBackend:
    SettlementDatabase + InventoryManagement + CartManagement + NotificationManagement
{
}

impl<T> SettlementBackend for T where T: SettlementDatabase + InventoryManagement + CartManagement + NotificationManagement
{}
