use crate::{
    DataError,
    ingest::{FormatHint, lines::Lines},
};
use serde_json::Value;
use std::io::{BufRead, Read};

/// Whole-entry JSON documents larger than this are rejected with [`DataError::EntryTooLarge`].
pub const MAX_JSON_ENTRY_BYTES: usize = 1024 * 1024;

/// Record format of one logical entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryFormat {
    Csv,
    Json,
    Jsonl,
}

/// Resolve the [`EntryFormat`] of an entry from the hint, falling back to its extension.
///
/// `.csv` is CSV, `.jsonl`/`.ndjson` are JSONL, anything else is whole-entry JSON.
pub fn detect(format_name: &str, hint: FormatHint) -> EntryFormat {
    match hint {
        FormatHint::Csv => EntryFormat::Csv,
        FormatHint::Json => EntryFormat::Json,
        FormatHint::Jsonl => EntryFormat::Jsonl,
        FormatHint::Auto => {
            let extension = format_name.rsplit_once('.').map(|(_, extension)| extension);
            match extension {
                Some("csv") => EntryFormat::Csv,
                Some("jsonl") | Some("ndjson") => EntryFormat::Jsonl,
                _ => EntryFormat::Json,
            }
        }
    }
}

/// Iterator over the raw records of one logical entry, as loosely-typed JSON values.
///
/// CSV rows become objects keyed by the header row, with every value a string.
pub enum Records {
    Csv {
        file: String,
        headers: Vec<String>,
        rows: csv::StringRecordsIntoIter<Box<dyn BufRead + Send>>,
        row: u64,
    },
    Jsonl {
        file: String,
        lines: Lines<Box<dyn BufRead + Send>>,
        line: u64,
    },
    Json {
        values: std::vec::IntoIter<Value>,
    },
}

impl std::fmt::Debug for Records {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv { file, row, .. } => f
                .debug_struct("Records::Csv")
                .field("file", file)
                .field("row", row)
                .finish_non_exhaustive(),
            Self::Jsonl { file, line, .. } => f
                .debug_struct("Records::Jsonl")
                .field("file", file)
                .field("line", line)
                .finish_non_exhaustive(),
            Self::Json { .. } => f.debug_struct("Records::Json").finish_non_exhaustive(),
        }
    }
}

/// Open a [`Records`] iterator over the provided entry reader.
pub fn open_records(
    reader: Box<dyn BufRead + Send>,
    format: EntryFormat,
    file: String,
) -> Result<Records, DataError> {
    match format {
        EntryFormat::Csv => {
            let mut rows = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(false)
                .from_reader(reader);

            let headers = rows
                .headers()
                .map_err(|error| DataError::parse(file.as_str(), 1, error.to_string()))?
                .iter()
                .map(str::to_string)
                .collect();

            Ok(Records::Csv {
                file,
                headers,
                rows: rows.into_records(),
                row: 1,
            })
        }
        EntryFormat::Jsonl => Ok(Records::Jsonl {
            file,
            lines: Lines::new(reader),
            line: 0,
        }),
        EntryFormat::Json => {
            let mut contents = String::new();
            reader
                .take(MAX_JSON_ENTRY_BYTES as u64 + 1)
                .read_to_string(&mut contents)
                .map_err(|error| DataError::io(file.as_str(), error))?;

            if contents.len() > MAX_JSON_ENTRY_BYTES {
                return Err(DataError::EntryTooLarge {
                    file,
                    limit: MAX_JSON_ENTRY_BYTES,
                });
            }

            let document: Value = serde_json::from_str(&contents)
                .map_err(|error| {
                    DataError::parse(file.as_str(), error.line() as u64, error.to_string())
                })?;

            let values = match document {
                Value::Array(values) => values,
                object @ Value::Object(_) => vec![object],
                other => {
                    return Err(DataError::parse(
                        file.as_str(),
                        1,
                        format!("expected JSON array or object, found: {other}"),
                    ));
                }
            };

            Ok(Records::Json {
                values: values.into_iter(),
            })
        }
    }
}

impl Iterator for Records {
    type Item = Result<Value, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Csv {
                file,
                headers,
                rows,
                row,
            } => {
                let record = rows.next()?;
                *row += 1;

                Some(record.map_err(|error| DataError::parse(file.as_str(), *row, error.to_string())).map(
                    |record| {
                        let fields = headers
                            .iter()
                            .zip(record.iter())
                            .map(|(header, value)| {
                                (header.clone(), Value::String(value.to_string()))
                            })
                            .collect();
                        Value::Object(fields)
                    },
                ))
            }
            Self::Jsonl { file, lines, line } => loop {
                let candidate = lines.next()?;
                *line += 1;

                match candidate {
                    Ok(text) if text.trim().is_empty() => continue,
                    Ok(text) => {
                        return Some(serde_json::from_str(&text).map_err(|error| {
                            DataError::parse(file.as_str(), *line, error.to_string())
                        }));
                    }
                    Err(error) => return Some(Err(DataError::io(file.as_str(), error))),
                }
            },
            Self::Json { values } => values.next().map(Ok),
        }
    }
}
