use crate::DataError;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

/// Transport of one input file, detected from its extension.
///
/// A zip archive carries its logical entries in lexicographic name order; each entry is read as
/// its own logical file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum IngestSource {
    Plain,
    Gzip,
    Zip(Vec<String>),
}

/// One logical input: a file plus the archive entry within it (zip only).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogicalEntry {
    pub file: PathBuf,
    pub entry: Option<String>,
}

impl LogicalEntry {
    /// The name format detection should consider: the archive entry name when present, else the
    /// file name with any transport suffix (`.gz`) stripped.
    pub fn format_name(&self) -> &str {
        match &self.entry {
            Some(entry) => entry.as_str(),
            None => {
                let name = self
                    .file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or_default();
                name.strip_suffix(".gz").unwrap_or(name)
            }
        }
    }

    /// Display label used in error context.
    pub fn label(&self) -> String {
        match &self.entry {
            Some(entry) => format!("{}!{}", self.file.display(), entry),
            None => self.file.display().to_string(),
        }
    }
}

/// Expand the provided path patterns into concrete file paths.
///
/// Patterns containing `*` or `?` expand via glob (matches sorted lexicographically for
/// determinism); any other path is used verbatim.
pub fn expand_paths<P>(patterns: &[P]) -> Result<Vec<PathBuf>, DataError>
where
    P: AsRef<str>,
{
    let mut paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if pattern.contains('*') || pattern.contains('?') {
            let mut matches = glob::glob(pattern)?
                .map(|path| {
                    path.map_err(|error| {
                        let path = error.path().display().to_string();
                        DataError::io(path, error.into_error())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            matches.sort();
            paths.extend(matches);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Detect the [`IngestSource`] transport of the provided file.
///
/// Zip archives are opened to list their entries.
pub fn inspect(path: &Path) -> Result<IngestSource, DataError> {
    match extension(path) {
        Some("gz") => Ok(IngestSource::Gzip),
        Some("zip") => {
            let file = File::open(path).map_err(|error| DataError::io(path.display().to_string(), error))?;
            let archive = zip::ZipArchive::new(file).map_err(|error| DataError::Zip {
                path: path.display().to_string(),
                source: error,
            })?;

            let mut entries = archive
                .file_names()
                .map(str::to_string)
                .collect::<Vec<_>>();
            entries.sort();
            Ok(IngestSource::Zip(entries))
        }
        _ => Ok(IngestSource::Plain),
    }
}

/// Flatten the provided file into its ordered [`LogicalEntry`]s.
pub fn list_entries(path: &Path) -> Result<Vec<LogicalEntry>, DataError> {
    match inspect(path)? {
        IngestSource::Plain | IngestSource::Gzip => Ok(vec![LogicalEntry {
            file: path.to_path_buf(),
            entry: None,
        }]),
        IngestSource::Zip(entries) => Ok(entries
            .into_iter()
            .map(|entry| LogicalEntry {
                file: path.to_path_buf(),
                entry: Some(entry),
            })
            .collect()),
    }
}

/// Open a [`LogicalEntry`] for buffered line reading.
pub fn open_entry(entry: &LogicalEntry) -> Result<Box<dyn BufRead + Send>, DataError> {
    let path = &entry.file;
    let io_error = |error| DataError::io(entry.label(), error);

    let file = File::open(path).map_err(io_error)?;

    match (&entry.entry, extension(path)) {
        (Some(name), _) => {
            let mut archive = zip::ZipArchive::new(file).map_err(|error| DataError::Zip {
                path: entry.label(),
                source: error,
            })?;
            let mut compressed = archive.by_name(name).map_err(|error| DataError::Zip {
                path: entry.label(),
                source: error,
            })?;

            // zip entries borrow the archive, so decompress into memory up front
            let mut buffer = Vec::with_capacity(compressed.size() as usize);
            compressed.read_to_end(&mut buffer).map_err(io_error)?;
            Ok(Box::new(std::io::Cursor::new(buffer)))
        }
        (None, Some("gz")) => Ok(Box::new(BufReader::new(flate2::read::GzDecoder::new(file)))),
        (None, _) => Ok(Box::new(BufReader::new(file))),
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|extension| extension.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_expand_paths_verbatim_and_glob() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.csv", "a.csv", "c.jsonl"] {
            std::fs::write(dir.path().join(name), "x\n").unwrap();
        }

        // verbatim path is passed through even if it does not exist
        let verbatim = expand_paths(&["/definitely/missing.csv"]).unwrap();
        assert_eq!(verbatim, vec![PathBuf::from("/definitely/missing.csv")]);

        // glob matches are sorted lexicographically
        let pattern = format!("{}/*.csv", dir.path().display());
        let matched = expand_paths(&[pattern]).unwrap();
        assert_eq!(
            matched,
            vec![dir.path().join("a.csv"), dir.path().join("b.csv")]
        );
    }

    #[test]
    fn test_inspect_transports() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("trades.csv");
        std::fs::write(&plain, "x\n").unwrap();
        assert_eq!(inspect(&plain).unwrap(), IngestSource::Plain);

        let gz = dir.path().join("trades.csv.gz");
        std::fs::write(&gz, "not actually inspected\n").unwrap();
        assert_eq!(inspect(&gz).unwrap(), IngestSource::Gzip);

        let zip_path = dir.path().join("day.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for name in ["b.csv", "a.csv"] {
            writer.start_file(name, options).unwrap();
            writer.write_all(b"x\n").unwrap();
        }
        writer.finish().unwrap();

        // entries are listed in lexicographic order regardless of archive order
        assert_eq!(
            inspect(&zip_path).unwrap(),
            IngestSource::Zip(vec!["a.csv".to_string(), "b.csv".to_string()])
        );
    }

    #[test]
    fn test_format_name_strips_transport_suffix() {
        let entry = LogicalEntry {
            file: PathBuf::from("/data/trades.jsonl.gz"),
            entry: None,
        };
        assert_eq!(entry.format_name(), "trades.jsonl");

        let zipped = LogicalEntry {
            file: PathBuf::from("/data/day.zip"),
            entry: Some("trades.csv".to_string()),
        };
        assert_eq!(zipped.format_name(), "trades.csv");
    }

    #[test]
    fn test_open_entry_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt.gz");

        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"first\nsecond\n").unwrap();
        encoder.finish().unwrap();

        let mut reader = open_entry(&LogicalEntry {
            file: path,
            entry: None,
        })
        .unwrap();
        let mut contents = String::new();
        reader.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
