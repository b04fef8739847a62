//! Marketplace Settlement Engine
//!
//! This library contains the core logic for settling marketplace orders in response to asynchronous
//! payment-provider webhook events. It is provider-agnostic and transport-agnostic: the HTTP surface lives in the
//! `settlement_server` crate, and the payout transfer client in `transfer_tools`.
//!
//! The library is divided into three main sections:
//! 1. The collaborator contracts ([`mod@traits`]). Order, inventory, cart and notification storage, plus the
//!    external payout capability, are defined as traits. A SQLite implementation of the storage traits is provided
//!    ([`SqliteDatabase`]); you should never need to run queries directly.
//! 2. The settlement pipeline ([`SettlementFlowApi`]). One entry point, [`SettlementFlowApi::process_charge_event`],
//!    drives the full pipeline: event classification, the idempotency guard, inventory adjustment, per-seller
//!    payout dispatch and the post-payment fan-out.
//! 3. The event hooks ([`mod@events`]). Settlement milestones (order settled, order annulled, payout failed) are
//!    published through a simple async pub-sub channel so that callers can react without coupling to the pipeline.
mod settlement_api;

pub mod charge_types;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use settlement_api::{OrderAggregate, SellerGroup, SettlementFlowApi, SettlementOutcome};
