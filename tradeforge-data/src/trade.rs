use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tradeforge_instrument::{
    Side,
    asset::Symbol,
    fixed::{Price, Qty},
};

/// Normalised public trade print.
///
/// `side` is the aggressor side when the venue reports one (directly, or derived from a
/// buyer-is-maker flag); `aggressor` mirrors it for venues that report both independently.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct Trade {
    pub ts: u64,
    pub symbol: Symbol,
    pub price: Price,
    pub qty: Qty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggressor: Option<Side>,
}
