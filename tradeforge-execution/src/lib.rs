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

//! # TradeForge-Execution
//! The deterministic matching engine of the TradeForge replay & trading-simulation platform.
//! Consumes the merged market timeline and maintains accounts, orders, balances and fills:
//! * **Orders**: id-keyed [`OrderStore`](order::store::OrderStore) with eager per-side pending
//!   sets and full lifecycle transitions.
//! * **Admission**: the conservative [`ConservativeGate`](engine::gate::ConservativeGate)
//!   requires a recent qualifying trade print before a LIMIT order may fill.
//! * **Liquidity**: the [`planner`](engine::planner) walks the local book snapshot best-price
//!   first, respecting side, limit price and slippage caps.
//! * **Accounts**: free/locked [`Balance`](balance::Balance)s per currency with maker/taker fee
//!   accrual - see [`balance::Accounts`].
//! * **Events**: subscribers observe the engine through the [`EventBus`](engine::bus::EventBus);
//!   hosts consume the stable [`ExecutionReport`](report::ExecutionReport) contract.

use crate::{balance::AccountId, order::OrderId};
use thiserror::Error;
use tradeforge_instrument::{asset::Asset, fixed::Amount, fixed::FixedPointError};

/// Account balances and the [`Accounts`](balance::Accounts) service.
pub mod balance;

/// The matching [`Engine`](engine::Engine): options, admission gate, liquidity planner and
/// event bus.
pub mod engine;

/// Order model and the id-keyed [`OrderStore`](order::store::OrderStore).
pub mod order;

/// Stable host-facing event contract.
pub mod report;

/// Serializable engine and exchange state snapshots.
pub mod snapshot;

/// All errors generated by the TradeForge-Execution matching engine.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ExecutionError {
    #[error("engine is closed")]
    EngineClosed,

    #[error("unknown order: {order_id}")]
    OrderUnknown { order_id: OrderId },

    #[error("order id already exists: {order_id}")]
    OrderIdTaken { order_id: OrderId },

    #[error("insufficient {currency} balance for {account}: need {need}, have {have}")]
    InsufficientBalance {
        account: AccountId,
        currency: Asset,
        need: Amount,
        have: Amount,
    },

    #[error("insufficient liquidity to fill order")]
    LiquidityExhausted,

    #[error("fixed-point arithmetic failed: {0}")]
    Numeric(#[from] FixedPointError),
}
