use crate::{
    DataError,
    event::{EventSource, MarketEvent, MergedEvent},
    ingest::{
        ReaderOptions,
        cursor::Cursor,
        files::{self, LogicalEntry},
        format::{self, Records},
        normalise,
    },
    merge::CursoredEvents,
};
use smol_str::SmolStr;
use std::path::Path;
use tradeforge_instrument::scale::{ScaleSpec, SymbolScaleMap};
use tracing::debug;

/// Cursored multi-file reader emitting decorated, normalised market events.
///
/// Files are consumed in the provided order, zip entries in lexicographic order within their
/// archive. Every emitted event carries the reader's [`EventSource`] tag and a session-wide
/// strictly-increasing `seq` starting at 0.
#[derive(Debug)]
pub struct RecordReader {
    options: ReaderOptions,
    scales: ScaleSpec,
    source: EventSource,
    entries: Vec<LogicalEntry>,
    entry_index: usize,
    records: Option<Records>,
    record_index: u64,
    seq_next: u32,
    emitted: u64,
    prev_ts: Option<u64>,
    last_cursor: Option<Cursor>,
    finished: bool,
}

impl RecordReader {
    /// Construct a [`RecordReader`] over the provided paths (glob patterns expand).
    pub fn new<P>(
        paths: &[P],
        options: ReaderOptions,
        scale_map: &SymbolScaleMap,
    ) -> Result<Self, DataError>
    where
        P: AsRef<str>,
    {
        let scales = match options.scale_override {
            Some(scales) => scales,
            None => scale_map.resolve(&options.symbol)?,
        };

        let mut entries = Vec::new();
        for file in files::expand_paths(paths)? {
            entries.extend(files::list_entries(&file)?);
        }

        debug!(
            symbol = %options.symbol,
            kind = ?options.kind,
            entries = entries.len(),
            "opened record reader"
        );

        Ok(Self {
            source: options.source_tag.unwrap_or(options.kind.default_source()),
            options,
            scales,
            entries,
            entry_index: 0,
            records: None,
            record_index: 0,
            seq_next: 0,
            emitted: 0,
            prev_ts: None,
            last_cursor: None,
            finished: false,
        })
    }

    /// Re-open a [`RecordReader`] at a previously captured [`Cursor`].
    ///
    /// The next emitted record is the one immediately after the cursor position; the per-source
    /// sequence numbering continues from `cursor.seq` when present.
    pub fn open_at<P>(
        paths: &[P],
        options: ReaderOptions,
        scale_map: &SymbolScaleMap,
        cursor: &Cursor,
    ) -> Result<Self, DataError>
    where
        P: AsRef<str>,
    {
        let mut reader = Self::new(paths, options, scale_map)?;

        let position = reader
            .entries
            .iter()
            .position(|candidate| {
                candidate.file == Path::new(&cursor.file) && candidate.entry == cursor.entry
            })
            .ok_or_else(|| {
                DataError::parse(&cursor.file, 0, "cursor names an unknown file or entry")
            })?;

        reader.entry_index = position;
        reader.open_current()?;

        // skip the records the cursor marks as consumed; a cursor parked at the end of its
        // entry simply rolls into the next one on the first `next()` call
        while reader.record_index < cursor.record_index {
            match reader
                .records
                .as_mut()
                .and_then(|records| records.next())
            {
                Some(Ok(_)) => reader.record_index += 1,
                Some(Err(error)) => return Err(error),
                None => break,
            }
        }

        reader.seq_next = cursor.seq.unwrap_or(0);
        reader.last_cursor = Some(cursor.clone());
        Ok(reader)
    }

    /// The [`ScaleSpec`] this reader normalises at.
    pub fn scales(&self) -> ScaleSpec {
        self.scales
    }

    fn open_current(&mut self) -> Result<(), DataError> {
        let entry = &self.entries[self.entry_index];
        let reader = files::open_entry(entry)?;
        let entry_format = format::detect(entry.format_name(), self.options.format);
        self.records = Some(format::open_records(reader, entry_format, entry.label())?);
        self.record_index = 0;
        Ok(())
    }

    fn decorate(
        &mut self,
        value: serde_json::Value,
        record_index: u64,
    ) -> Result<Option<MergedEvent>, DataError> {
        let entry = &self.entries[self.entry_index];
        let label = entry.label();
        let line = record_index + 1;

        let (ts, event) = match self.options.kind {
            super::RecordKind::Trades => {
                let trade = normalise::normalise_trade(
                    &value,
                    &self.options.mapping,
                    &self.options.symbol,
                    self.scales,
                    &label,
                    line,
                )?;
                (
                    trade.ts,
                    MergedEvent::Trade(MarketEvent {
                        ts: trade.ts,
                        source: self.source,
                        seq: self.seq_next,
                        entry: entry.entry.as_deref().map(SmolStr::new),
                        kind: trade,
                    }),
                )
            }
            super::RecordKind::Depth => {
                let diff = normalise::normalise_depth(
                    &value,
                    &self.options.mapping,
                    &self.options.symbol,
                    self.scales,
                    &label,
                    line,
                )?;
                (
                    diff.ts,
                    MergedEvent::Depth(MarketEvent {
                        ts: diff.ts,
                        source: self.source,
                        seq: self.seq_next,
                        entry: entry.entry.as_deref().map(SmolStr::new),
                        kind: diff,
                    }),
                )
            }
        };

        if self.options.assert_monotonic_timestamps
            && let Some(prev) = self.prev_ts
            && ts < prev
        {
            return Err(DataError::TimestampRegression {
                prev,
                current: ts,
                file: label,
            });
        }
        self.prev_ts = Some(ts);

        if let Some(filter) = &self.options.time_filter
            && !filter.contains(ts)
        {
            return Ok(None);
        }

        self.seq_next += 1;
        self.emitted += 1;
        self.last_cursor = Some(Cursor {
            file: entry.file.display().to_string(),
            entry: entry.entry.clone(),
            record_index: record_index + 1,
            seq: Some(self.seq_next),
        });

        Ok(Some(event))
    }
}

impl Iterator for RecordReader {
    type Item = Result<MergedEvent, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(limit) = self.options.limit
            && self.emitted >= limit
        {
            self.finished = true;
            return None;
        }

        loop {
            if self.records.is_none() {
                if self.entry_index >= self.entries.len() {
                    self.finished = true;
                    return None;
                }
                if let Err(error) = self.open_current() {
                    self.finished = true;
                    return Some(Err(error));
                }
            }

            let next = self
                .records
                .as_mut()
                .and_then(|records| records.next());

            match next {
                None => {
                    self.records = None;
                    self.entry_index += 1;
                    self.record_index = 0;
                }
                Some(Err(error)) => {
                    self.finished = true;
                    return Some(Err(error));
                }
                Some(Ok(value)) => {
                    let record_index = self.record_index;
                    self.record_index += 1;

                    match self.decorate(value, record_index) {
                        Ok(Some(event)) => return Some(Ok(event)),
                        Ok(None) => {}
                        Err(error) => {
                            self.finished = true;
                            return Some(Err(error));
                        }
                    }
                }
            }
        }
    }
}

impl CursoredEvents for RecordReader {
    fn cursor(&self) -> Option<Cursor> {
        self.last_cursor.clone()
    }
}
