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

//! # TradeForge-Data
//! Normalised market-data ingest for the TradeForge replay & trading-simulation platform. It:
//! * **Reads**: streams trade prints and L2 depth diffs line-by-line from plain, gzip and zip
//!   files in CSV, JSON and JSONL formats - see [`ingest`].
//! * **Normalises**: every record is converted into the canonical fixed-point
//!   [`Trade`](trade::Trade) / [`DepthDiff`](books::DepthDiff) form at the symbol's resolved
//!   scale, then decorated with `(source, seq, entry)` - see [`event`].
//! * **Merges**: two cursored event sources combine into one deterministic monotonically
//!   non-decreasing timeline with explicit tie-break state - see [`merge`].
//! * **Tracks**: an incremental local L2 [`OrderBook`](books::OrderBook) applies depth diffs and
//!   exports depth-limited snapshots - see [`books`].

use thiserror::Error;
use tradeforge_instrument::{fixed::FixedPointError, scale::ScaleError};

/// Incremental L2 [`OrderBook`](books::OrderBook), its [`Level`](books::Level)s and the
/// [`DepthDiff`](books::DepthDiff) record that drives it.
pub mod books;

/// Decorated market events: [`EventSource`](event::EventSource) tagging, per-source sequence
/// numbers, and the [`MergedEvent`](event::MergedEvent) union.
pub mod event;

/// File ingest: path expansion, transport & format detection, record normalisation and the
/// cursored [`RecordReader`](ingest::reader::RecordReader).
pub mod ingest;

/// Deterministic two-source timeline merge with one-shot tie-break state.
pub mod merge;

/// Normalised public trade print.
pub mod trade;

/// All errors generated by TradeForge-Data ingest and merging.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("zip archive error in {path}: {source}")]
    Zip {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("malformed record at {file}:{line}: {reason}")]
    Parse {
        file: String,
        line: u64,
        reason: String,
    },

    #[error("JSON entry exceeds the {limit} byte limit: {file}")]
    EntryTooLarge { file: String, limit: usize },

    #[error("timestamp regression in {file}: {current} < {prev}")]
    TimestampRegression {
        prev: u64,
        current: u64,
        file: String,
    },

    #[error("scale resolution failed: {0}")]
    Scale(#[from] ScaleError),

    #[error("fixed-point conversion failed: {0}")]
    Numeric(#[from] FixedPointError),
}

impl DataError {
    /// Construct an [`DataError::Io`] with the offending path attached.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Construct a [`DataError::Parse`] with record coordinates attached.
    pub fn parse(file: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }
}
