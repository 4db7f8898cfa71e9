#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments, type_alias_bounds)]

//! # TradeForge-Instrument
//! TradeForge-Instrument contains the core Symbol, Market and fixed-point numeric data structures
//! used across the TradeForge replay & trading-simulation platform.
//!
//! Prices and quantities are exact scaled integers - see [`fixed`] for the numeric domain and
//! [`scale`] for per-symbol scale resolution.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// [`Asset`](asset::Asset), [`Symbol`](asset::Symbol) and [`Market`](asset::Market) identifiers.
pub mod asset;

/// Exact fixed-point numeric domain: [`Price`](fixed::Price), [`Qty`](fixed::Qty) and
/// [`Amount`](fixed::Amount) scaled integers with parse/format and checked arithmetic.
pub mod fixed;

/// Per-symbol `(price_scale, qty_scale)` resolution.
pub mod scale;

/// [`Side`] of a trade or order - Buy or Sell.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub enum Side {
    #[serde(alias = "buy", alias = "BUY", alias = "b", alias = "B")]
    Buy,
    #[serde(alias = "sell", alias = "SELL", alias = "s", alias = "S")]
    Sell,
}

impl Side {
    /// Return the opposing [`Side`].
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Side::Buy => "buy",
                Side::Sell => "sell",
            }
        )
    }
}
