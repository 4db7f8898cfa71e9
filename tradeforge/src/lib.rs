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

//! # TradeForge
//! Deterministic market-data replay and trading-simulation platform. Historical trade prints
//! and L2 depth diffs are ingested from per-symbol files, normalised into canonical fixed-point
//! form, merged into a single monotonically non-decreasing timeline and fed to a matching
//! engine maintaining accounts, orders, balances and fills.
//!
//! This crate wires the platform together:
//! * **Clocks**: logical, wall and accelerated [`SimClock`](clock::SimClock)s pace the replay.
//! * **Replay**: the [`ReplayDriver`](replay::ReplayDriver) drives the merged timeline through
//!   a clock, enforcing limits and cooperating with the pause/resume
//!   [`ReplayController`](replay::controller::ReplayController).
//! * **Checkpoints**: [`Checkpoint`](checkpoint::Checkpoint) captures cursors, merge tie-break
//!   state and the engine snapshot, written atomically and restorable to an identical
//!   continuation.
//!
//! The ingest, merge and book layers live in `tradeforge-data`; the matching engine, accounts
//! and fees in `tradeforge-execution`; the fixed-point numeric domain in
//! `tradeforge-instrument`.

/// Checkpoint capture, atomic persistence and restore wiring.
pub mod checkpoint;

/// Simulation clocks: logical, wall and accelerated.
pub mod clock;

/// Top-level error composing the platform's crate errors.
pub mod error;

/// Default `tracing` subscriber initialisation.
pub mod logging;

/// The replay driver, its limits, stats and pause/resume controller.
pub mod replay;

pub use error::TradeForgeError;
