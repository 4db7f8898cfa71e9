use crate::{TradeForgeError, clock::wall_now_ms};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tradeforge_data::{
    ingest::{ReaderOptions, reader::RecordReader},
    merge::{MergeCursors, MergeStartState, TimelineMerger},
};
use tradeforge_execution::{
    engine::Engine,
    snapshot::{EngineSnapshot, SerializedExchangeState},
};
use tradeforge_instrument::{asset::Symbol, scale::SymbolScaleMap};
use tracing::debug;
use uuid::Uuid;

/// The checkpoint document version this build reads and writes.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Checkpoint annotations.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct CheckpointMeta {
    pub symbol: Symbol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Checkpoint v1: everything needed to continue a replay run exactly where it stopped.
///
/// `cursors` are the per-source read positions after the last emitted event, `merge` the
/// one-shot tie-break the rebuilt merger must start with, `engine` the matching-engine snapshot
/// and `state` the account ledger. All fixed-point fields encode as decimal strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub version: u32,
    pub created_at_ms: u64,
    pub meta: CheckpointMeta,
    pub cursors: MergeCursors,
    pub merge: MergeStartState,
    pub engine: EngineSnapshot,
    pub state: SerializedExchangeState,
}

impl Checkpoint {
    /// Capture a [`Checkpoint`] from the current merger and engine state.
    pub fn capture(
        meta: CheckpointMeta,
        cursors: MergeCursors,
        merge: MergeStartState,
        engine: &Engine,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            created_at_ms: wall_now_ms(),
            meta,
            cursors,
            merge,
            engine: engine.snapshot(),
            state: engine.state(),
        }
    }

    /// Atomically persist the checkpoint: write `tmp-<uuid>.json` next to the destination,
    /// then rename. Readers never observe a partial document.
    pub fn save_atomic(&self, path: &Path) -> Result<(), TradeForgeError> {
        let json = serde_json::to_string_pretty(self).map_err(|error| {
            TradeForgeError::CheckpointCorrupt {
                reason: format!("serialization failed: {error}"),
            }
        })?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = parent.join(format!("tmp-{}.json", Uuid::new_v4()));

        std::fs::write(&tmp, json)
            .map_err(|error| TradeForgeError::io(tmp.display().to_string(), error))?;
        std::fs::rename(&tmp, path)
            .map_err(|error| TradeForgeError::io(path.display().to_string(), error))?;

        debug!(path = %path.display(), "checkpoint persisted");
        Ok(())
    }

    /// Load and validate a checkpoint document.
    pub fn load(path: &Path) -> Result<Self, TradeForgeError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|error| TradeForgeError::io(path.display().to_string(), error))?;

        let document: serde_json::Value =
            serde_json::from_str(&contents).map_err(|error| TradeForgeError::CheckpointCorrupt {
                reason: error.to_string(),
            })?;

        let version = document
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| TradeForgeError::CheckpointCorrupt {
                reason: "missing version field".to_string(),
            })?;
        if version != CHECKPOINT_VERSION as u64 {
            return Err(TradeForgeError::CheckpointVersionMismatch {
                expected: CHECKPOINT_VERSION,
                found: version as u32,
            });
        }

        serde_json::from_value(document).map_err(|error| TradeForgeError::CheckpointCorrupt {
            reason: error.to_string(),
        })
    }
}

/// Rebuild the merger and engine from a loaded [`Checkpoint`].
///
/// Each reader re-opens at its saved cursor (a missing cursor means that source never emitted,
/// so it starts fresh); the merger starts with the saved one-shot tie-break; the engine
/// rehydrates from its snapshot. The continuation is identical to an uninterrupted run.
pub fn restore_replay<P>(
    trade_paths: &[P],
    trade_options: ReaderOptions,
    depth_paths: &[P],
    depth_options: ReaderOptions,
    scale_map: &SymbolScaleMap,
    checkpoint: Checkpoint,
) -> Result<(TimelineMerger<RecordReader, RecordReader>, Engine), TradeForgeError>
where
    P: AsRef<str>,
{
    let trades = match &checkpoint.cursors.trades {
        Some(cursor) => RecordReader::open_at(trade_paths, trade_options, scale_map, cursor)?,
        None => RecordReader::new(trade_paths, trade_options, scale_map)?,
    };
    let depth = match &checkpoint.cursors.depth {
        Some(cursor) => RecordReader::open_at(depth_paths, depth_options, scale_map, cursor)?,
        None => RecordReader::new(depth_paths, depth_options, scale_map)?,
    };

    let prefer_depth = checkpoint.engine.options.prefer_depth_on_equal_ts;
    let merger = TimelineMerger::new(trades, depth, checkpoint.merge, prefer_depth);
    let engine = Engine::restore(checkpoint.engine, checkpoint.state);
    Ok((merger, engine))
}
