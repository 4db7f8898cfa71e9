use crate::{
    balance::Accounts,
    engine::{gate::RecentTrade, options::EngineOptions},
    order::Order,
};
use serde::{Deserialize, Serialize};
use tradeforge_data::books::OrderBook;

/// Serializable matching-engine snapshot: options, orders with their acceptance counter, gate
/// state and the local book.
///
/// All fixed-point fields encode as decimal strings of their raw scaled integers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub options: EngineOptions,
    pub orders: Vec<Order>,
    pub order_sequence: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_last_buy: Option<RecentTrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_last_sell: Option<RecentTrade>,
    pub book: OrderBook,
    pub now: u64,
}

/// Serializable account ledger of the exchange.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SerializedExchangeState {
    pub accounts: Accounts,
}
