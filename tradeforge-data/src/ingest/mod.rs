use crate::{DataError, event::EventSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tradeforge_instrument::{asset::Symbol, scale::ScaleSpec};

/// Resumable read positions.
pub mod cursor;

/// Path expansion, transport detection and logical entry access.
pub mod files;

/// Per-entry record format detection and iteration.
pub mod format;

/// Buffered line splitting.
pub mod lines;

/// Raw record normalisation into canonical fixed-point form.
pub mod normalise;

/// The cursored, decorating [`RecordReader`](reader::RecordReader).
pub mod reader;

/// Kind of records a reader ingests.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Trades,
    Depth,
}

impl RecordKind {
    /// The [`EventSource`] records of this kind decorate to by default.
    pub fn default_source(self) -> EventSource {
        match self {
            Self::Trades => EventSource::Trades,
            Self::Depth => EventSource::Depth,
        }
    }
}

/// Record format hint; `Auto` detects per entry from the file extension.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    #[default]
    Auto,
    Csv,
    Json,
    Jsonl,
}

/// Inclusive `from_ms <= ts <= to_ms` timestamp filter.
///
/// An absent bound is unbounded; an explicit `Some(0)` lower bound is a real bound.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_ms: Option<u64>,
}

impl TimeFilter {
    /// Determine if the provided timestamp passes the filter.
    pub fn contains(&self, ts: u64) -> bool {
        if let Some(from) = self.from_ms
            && ts < from
        {
            return false;
        }
        if let Some(to) = self.to_ms
            && ts > to
        {
            return false;
        }
        true
    }
}

/// Configuration of one [`RecordReader`](reader::RecordReader).
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub kind: RecordKind,
    pub symbol: Symbol,
    pub format: FormatHint,
    pub mapping: normalise::FieldMapping,
    pub scale_override: Option<ScaleSpec>,
    pub time_filter: Option<TimeFilter>,
    pub limit: Option<u64>,
    pub assert_monotonic_timestamps: bool,
    /// Overrides the [`EventSource`] tag derived from `kind`.
    pub source_tag: Option<EventSource>,
}

impl ReaderOptions {
    /// Construct [`ReaderOptions`] for the provided kind and symbol, with defaults elsewhere.
    pub fn new<S>(kind: RecordKind, symbol: S) -> Self
    where
        S: Into<Symbol>,
    {
        Self {
            kind,
            symbol: symbol.into(),
            format: FormatHint::Auto,
            mapping: normalise::FieldMapping::default(),
            scale_override: None,
            time_filter: None,
            limit: None,
            assert_monotonic_timestamps: false,
            source_tag: None,
        }
    }

    /// Construct trade-print [`ReaderOptions`].
    pub fn trades<S>(symbol: S) -> Self
    where
        S: Into<Symbol>,
    {
        Self::new(RecordKind::Trades, symbol)
    }

    /// Construct depth-diff [`ReaderOptions`].
    pub fn depth<S>(symbol: S) -> Self
    where
        S: Into<Symbol>,
    {
        Self::new(RecordKind::Depth, symbol)
    }

    pub fn with_format(mut self, format: FormatHint) -> Self {
        self.format = format;
        self
    }

    pub fn with_time_filter(mut self, filter: TimeFilter) -> Self {
        self.time_filter = Some(filter);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_scale_override(mut self, scales: ScaleSpec) -> Self {
        self.scale_override = Some(scales);
        self
    }

    pub fn with_monotonic_timestamps(mut self) -> Self {
        self.assert_monotonic_timestamps = true;
        self
    }
}

/// Abstract provider of historical archive files for a `(symbol, day)` request.
///
/// Dataset downloaders live outside the core; the readers only consume the local paths a
/// fetcher resolves to.
#[async_trait]
pub trait ArchiveFetcher {
    /// Fetch (or locate) the archive files covering `symbol` on `day`, returning local paths.
    async fn fetch(&self, symbol: &Symbol, day: NaiveDate) -> Result<Vec<PathBuf>, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_filter_contains() {
        struct TestCase {
            filter: TimeFilter,
            ts: u64,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: unbounded filter passes everything
                filter: TimeFilter::default(),
                ts: 0,
                expected: true,
            },
            TestCase {
                // TC1: inclusive bounds
                filter: TimeFilter {
                    from_ms: Some(10),
                    to_ms: Some(20),
                },
                ts: 10,
                expected: true,
            },
            TestCase {
                // TC2: below the lower bound
                filter: TimeFilter {
                    from_ms: Some(10),
                    to_ms: Some(20),
                },
                ts: 9,
                expected: false,
            },
            TestCase {
                // TC3: above the upper bound
                filter: TimeFilter {
                    from_ms: Some(10),
                    to_ms: Some(20),
                },
                ts: 21,
                expected: false,
            },
            TestCase {
                // TC4: an explicit zero lower bound is honoured as a real bound
                filter: TimeFilter {
                    from_ms: Some(0),
                    to_ms: None,
                },
                ts: 0,
                expected: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.filter.contains(test.ts), test.expected, "TC{index} failed");
        }
    }
}
