use crate::{
    DataError,
    event::{EventSource, MergedEvent},
    ingest::cursor::Cursor,
};
use serde::{Deserialize, Serialize};

/// An event source that can report the read position immediately after its last yielded record.
pub trait CursoredEvents: Iterator<Item = Result<MergedEvent, DataError>> {
    /// Position after the last yielded record, `None` before the first.
    fn cursor(&self) -> Option<Cursor>;
}

/// One-shot tie-break override applied at the first equal-ts collision after (re)start.
///
/// All subsequent equal-ts ties follow the global `prefer_depth_on_equal_ts` policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStartState {
    pub next_source_on_equal_ts: EventSource,
}

impl Default for MergeStartState {
    fn default() -> Self {
        Self {
            next_source_on_equal_ts: EventSource::Depth,
        }
    }
}

/// Pair of per-source cursors reflecting the positions after the merger's last emission.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct MergeCursors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades: Option<Cursor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Cursor>,
}

/// Deterministic two-source merge emitting a single timeline ordered by ts ascending.
///
/// At `ts_t < ts_d` the trade is emitted, at `ts_t > ts_d` the depth diff; equality is resolved
/// by the one-shot [`MergeStartState`] on the first tie and by `prefer_depth_on_equal_ts`
/// afterwards. When one side is exhausted the other drains unconditionally.
///
/// For identical inputs, start state and policy the output `(ts, source, seq)` sequence is
/// identical bit-for-bit.
#[derive(Debug)]
pub struct TimelineMerger<T, D> {
    trades: T,
    depth: D,
    peeked_trade: Option<MergedEvent>,
    peeked_depth: Option<MergedEvent>,
    // cursor after the record currently buffered in the peek slot
    pending_trades_cursor: Option<Cursor>,
    pending_depth_cursor: Option<Cursor>,
    // cursors after the last *emitted* record per source
    emitted_trades_cursor: Option<Cursor>,
    emitted_depth_cursor: Option<Cursor>,
    start: Option<EventSource>,
    prefer_depth_on_equal_ts: bool,
    failed: bool,
}

impl<T, D> TimelineMerger<T, D>
where
    T: CursoredEvents,
    D: CursoredEvents,
{
    /// Construct a new [`TimelineMerger`] from two cursored sources.
    pub fn new(trades: T, depth: D, start: MergeStartState, prefer_depth_on_equal_ts: bool) -> Self {
        Self {
            trades,
            depth,
            peeked_trade: None,
            peeked_depth: None,
            pending_trades_cursor: None,
            pending_depth_cursor: None,
            emitted_trades_cursor: None,
            emitted_depth_cursor: None,
            start: Some(start.next_source_on_equal_ts),
            prefer_depth_on_equal_ts,
            failed: false,
        }
    }

    /// The one-shot state a rebuilt merger must start with to continue this merger's
    /// tie-break behaviour: the unconsumed start override, else the global policy choice.
    pub fn start_state(&self) -> MergeStartState {
        MergeStartState {
            next_source_on_equal_ts: self.start.unwrap_or(if self.prefer_depth_on_equal_ts {
                EventSource::Depth
            } else {
                EventSource::Trades
            }),
        }
    }

    /// Per-source cursors reflecting positions after the last emitted event.
    ///
    /// Records buffered ahead inside the merger are not reflected until they are emitted.
    pub fn current_cursor(&self) -> MergeCursors {
        MergeCursors {
            trades: self.emitted_trades_cursor.clone(),
            depth: self.emitted_depth_cursor.clone(),
        }
    }

    /// Timestamp of the next event this merger would emit, without emitting it.
    ///
    /// Buffers records internally; the emitted cursors are untouched until the event is
    /// actually pulled with `next()`.
    pub fn peek_ts(&mut self) -> Result<Option<u64>, DataError> {
        if self.failed {
            return Ok(None);
        }

        if let Err(error) = self.fill_peeks() {
            self.failed = true;
            return Err(error);
        }

        Ok(match (&self.peeked_trade, &self.peeked_depth) {
            (None, None) => None,
            (Some(trade), None) => Some(trade.ts()),
            (None, Some(depth)) => Some(depth.ts()),
            (Some(trade), Some(depth)) => Some(trade.ts().min(depth.ts())),
        })
    }

    fn fill_peeks(&mut self) -> Result<(), DataError> {
        if self.peeked_trade.is_none() {
            if let Some(next) = self.trades.next() {
                self.peeked_trade = Some(next?);
                self.pending_trades_cursor = self.trades.cursor();
            }
        }
        if self.peeked_depth.is_none() {
            if let Some(next) = self.depth.next() {
                self.peeked_depth = Some(next?);
                self.pending_depth_cursor = self.depth.cursor();
            }
        }
        Ok(())
    }

    fn emit_trade(&mut self) -> Option<MergedEvent> {
        let event = self.peeked_trade.take()?;
        self.emitted_trades_cursor = self.pending_trades_cursor.clone();
        Some(event)
    }

    fn emit_depth(&mut self) -> Option<MergedEvent> {
        let event = self.peeked_depth.take()?;
        self.emitted_depth_cursor = self.pending_depth_cursor.clone();
        Some(event)
    }
}

impl<T, D> Iterator for TimelineMerger<T, D>
where
    T: CursoredEvents,
    D: CursoredEvents,
{
    type Item = Result<MergedEvent, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Err(error) = self.fill_peeks() {
            self.failed = true;
            return Some(Err(error));
        }

        let next_source = match (&self.peeked_trade, &self.peeked_depth) {
            (None, None) => return None,
            (Some(_), None) => EventSource::Trades,
            (None, Some(_)) => EventSource::Depth,
            (Some(trade), Some(depth)) => {
                if trade.ts() < depth.ts() {
                    EventSource::Trades
                } else if trade.ts() > depth.ts() {
                    EventSource::Depth
                } else if let Some(start) = self.start.take() {
                    start
                } else if self.prefer_depth_on_equal_ts {
                    EventSource::Depth
                } else {
                    EventSource::Trades
                }
            }
        };

        match next_source {
            EventSource::Trades => self.emit_trade().map(Ok),
            EventSource::Depth => self.emit_depth().map(Ok),
        }
    }
}
