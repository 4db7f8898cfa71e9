use crate::{books::DepthDiff, trade::Trade};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Origin stream of a decorated market event.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum EventSource {
    #[serde(rename = "TRADES")]
    #[display("TRADES")]
    Trades,
    #[serde(rename = "DEPTH")]
    #[display("DEPTH")]
    Depth,
}

/// Normalised record decorated with its origin `(source, seq, entry)`.
///
/// `seq` is strictly increasing per source across the whole ingest session; `entry` names the
/// archive entry the record came from when the source file was a zip.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct MarketEvent<Kind> {
    pub ts: u64,
    pub source: EventSource,
    pub seq: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<SmolStr>,
    pub kind: Kind,
}

/// A decorated trade print event.
pub type TradeEvent = MarketEvent<Trade>;

/// A decorated L2 depth diff event.
pub type DepthEvent = MarketEvent<DepthDiff>;

/// Union of the two event kinds flowing through the merged timeline.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergedEvent {
    Trade(TradeEvent),
    Depth(DepthEvent),
}

impl MergedEvent {
    /// Event timestamp in unix milliseconds.
    pub fn ts(&self) -> u64 {
        match self {
            Self::Trade(event) => event.ts,
            Self::Depth(event) => event.ts,
        }
    }

    /// Origin stream of this event.
    pub fn source(&self) -> EventSource {
        match self {
            Self::Trade(event) => event.source,
            Self::Depth(event) => event.source,
        }
    }

    /// Per-source sequence number of this event.
    pub fn seq(&self) -> u32 {
        match self {
            Self::Trade(event) => event.seq,
            Self::Depth(event) => event.seq,
        }
    }
}

impl From<TradeEvent> for MergedEvent {
    fn from(event: TradeEvent) -> Self {
        Self::Trade(event)
    }
}

impl From<DepthEvent> for MergedEvent {
    fn from(event: DepthEvent) -> Self {
        Self::Depth(event)
    }
}
