pub mod order_objects;
mod settlement_flow_api;

pub use order_objects::{OrderAggregate, SellerGroup};
pub use settlement_flow_api::{SettlementFlowApi, SettlementOutcome};
