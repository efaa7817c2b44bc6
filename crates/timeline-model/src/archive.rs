//! Loading and writing location-history archives.
//!
//! An archive root holds one subdirectory per year; each year holds one JSON
//! file per period. Loading is tolerant: a period that cannot be decoded or
//! parsed is logged, recorded in the [`LoadReport`], and left out, while the
//! rest of the archive still loads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;

use crate::timeline::TimelinePeriod;

const PERIOD_EXTENSION: &str = "json";

/// Periods keyed by period name, in sorted order.
pub type YearPeriods = BTreeMap<String, TimelinePeriod>;

/// The year → period tree of one export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineArchive {
    pub years: BTreeMap<String, YearPeriods>,
}

/// What a period file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodContent {
    Timeline(TimelinePeriod),
    /// Valid JSON with no data in it (`{}`, `null`, `[]`, ...).
    Empty,
}

/// Why a period file was left out of the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Io,
    Decode,
    Parse,
}

/// A period file that was left out, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
    pub detail: String,
}

/// Per-load accounting of what happened to every period file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub periods_loaded: usize,
    /// Files holding valid JSON with no data.
    pub empty_files: Vec<PathBuf>,
    /// Files that could not be read, decoded, or parsed.
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    pub fn parse_failures(&self) -> usize {
        self.skipped.len()
    }

    pub fn empty_count(&self) -> usize {
        self.empty_files.len()
    }
}

impl TimelineArchive {
    /// Load every period under `root`.
    ///
    /// Fails only when `root` is not a readable directory.
    pub fn load(root: impl AsRef<Path>) -> Result<(Self, LoadReport), ArchiveError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ArchiveError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut archive = Self::default();
        let mut report = LoadReport::default();

        for year_dir in sorted_entries(root)? {
            if !year_dir.is_dir() {
                continue;
            }
            let Some(year) = file_name(&year_dir) else {
                continue;
            };

            let period_files = match sorted_entries(&year_dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping year directory {}: {e}", year_dir.display());
                    report.skipped.push(SkippedFile {
                        path: year_dir.clone(),
                        reason: SkipReason::Io,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            for path in period_files.into_iter().filter(|p| is_period_file(p)) {
                let Some(period_name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match read_period_file(&path) {
                    Ok(PeriodContent::Timeline(period)) => {
                        archive
                            .years
                            .entry(year.clone())
                            .or_default()
                            .insert(period_name.to_string(), period);
                        report.periods_loaded += 1;
                    }
                    Ok(PeriodContent::Empty) => {
                        tracing::warn!("No data found in the file {}", path.display());
                        report.empty_files.push(path);
                    }
                    Err(e) => {
                        tracing::warn!("{e}");
                        report.skipped.push(SkippedFile {
                            reason: e.skip_reason(),
                            detail: e.to_string(),
                            path,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "Loaded {} period(s) from {} ({} empty, {} skipped)",
            report.periods_loaded,
            root.display(),
            report.empty_count(),
            report.parse_failures()
        );
        Ok((archive, report))
    }

    /// Write every period to `dir/<year>/<period>.json`.
    ///
    /// Returns the number of files written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<usize, ArchiveError> {
        let dir = dir.as_ref();
        let mut written = 0;
        for (year, periods) in &self.years {
            let year_dir = dir.join(year);
            std::fs::create_dir_all(&year_dir).map_err(|e| ArchiveError::Io {
                path: year_dir.clone(),
                source: e,
            })?;
            for (name, period) in periods {
                let path = year_dir.join(format!("{name}.{PERIOD_EXTENSION}"));
                let json =
                    serde_json::to_string_pretty(period).map_err(|e| ArchiveError::Parse {
                        path: path.clone(),
                        source: e,
                    })?;
                std::fs::write(&path, json).map_err(|e| ArchiveError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Iterate `(year, period name, period)` in sorted order.
    pub fn periods(&self) -> impl Iterator<Item = (&str, &str, &TimelinePeriod)> {
        self.years.iter().flat_map(|(year, periods)| {
            periods
                .iter()
                .map(move |(name, period)| (year.as_str(), name.as_str(), period))
        })
    }

    pub fn period_count(&self) -> usize {
        self.years.values().map(BTreeMap::len).sum()
    }

    pub fn insert(&mut self, year: impl Into<String>, name: impl Into<String>, period: TimelinePeriod) {
        self.years
            .entry(year.into())
            .or_default()
            .insert(name.into(), period);
    }
}

/// Read, decode, and parse one period file.
pub fn read_period_file(path: impl AsRef<Path>) -> Result<PeriodContent, ArchiveError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ArchiveError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let text = decode_period_bytes(&bytes).map_err(|encoding| ArchiveError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name(),
    })?;
    parse_period(&text).map_err(|e| match e {
        PeriodParseError::Json(source) => ArchiveError::Parse {
            path: path.to_path_buf(),
            source,
        },
        PeriodParseError::NotATimeline(kind) => ArchiveError::Structure {
            path: path.to_path_buf(),
            message: format!("expected a timeline object, found {kind}"),
        },
    })
}

/// Detect the text encoding of `bytes` and decode them.
///
/// A BOM wins; otherwise valid UTF-8 is taken as-is and anything else goes
/// through encoding detection. Returns the guessed encoding on malformed input.
pub fn decode_period_bytes(bytes: &[u8]) -> Result<String, &'static Encoding> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None if std::str::from_utf8(bytes).is_ok() => UTF_8,
        None => {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(actual);
    }
    Ok(text.into_owned())
}

enum PeriodParseError {
    Json(serde_json::Error),
    NotATimeline(&'static str),
}

fn parse_period(text: &str) -> Result<PeriodContent, PeriodParseError> {
    let value: Value = serde_json::from_str(text).map_err(PeriodParseError::Json)?;
    if is_empty_value(&value) {
        return Ok(PeriodContent::Empty);
    }
    match value {
        Value::Object(_) => serde_json::from_value(value)
            .map(PeriodContent::Timeline)
            .map_err(PeriodParseError::Json),
        Value::Array(_) => Err(PeriodParseError::NotATimeline("an array")),
        Value::String(_) => Err(PeriodParseError::NotATimeline("a string")),
        Value::Number(_) => Err(PeriodParseError::NotATimeline("a number")),
        Value::Bool(_) => Err(PeriodParseError::NotATimeline("a boolean")),
        Value::Null => Ok(PeriodContent::Empty),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// Every period file under `root`, recursively, sorted by file name within
/// each directory.
pub fn period_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_period_file(path))
}

fn is_period_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(PERIOD_EXTENSION)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let read = std::fs::read_dir(dir).map_err(|e| ArchiveError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut entries = read
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Errors that can occur when reading or writing archives.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Timeline root not found or not a directory: {path}")]
    RootNotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not decode {path} as {encoding}")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("Error parsing JSON in file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unexpected structure in {path}: {message}")]
    Structure { path: PathBuf, message: String },
}

impl ArchiveError {
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::RootNotFound { .. } | Self::Io { .. } => SkipReason::Io,
            Self::Decode { .. } => SkipReason::Decode,
            Self::Parse { .. } | Self::Structure { .. } => SkipReason::Parse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_and_bom() {
        assert_eq!(decode_period_bytes(b"{}").unwrap(), "{}");
        assert_eq!(decode_period_bytes(b"\xEF\xBB\xBF{}").unwrap(), "{}");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "{\"a\":1}".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_period_bytes(&bytes).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_decode_detects_legacy_single_byte_text() {
        // windows-1252 French text
        let bytes = b"{\"name\":\"Caf\xE9 de la Gare, \xE0 c\xF4t\xE9 de l'\xE9glise\"}";
        let text = decode_period_bytes(bytes).unwrap();
        assert!(text.contains("Caf"));
        assert!(serde_json::from_str::<Value>(&text).is_ok());
    }

    #[test]
    fn test_empty_values() {
        for raw in ["{}", "[]", "null", "\"\"", "false", "0"] {
            assert!(
                matches!(parse_period(raw), Ok(PeriodContent::Empty)),
                "{raw} should be empty"
            );
        }
    }

    #[test]
    fn test_non_object_content_is_structure_error() {
        assert!(matches!(
            parse_period("[1, 2]"),
            Err(PeriodParseError::NotATimeline("an array"))
        ));
        assert!(matches!(
            parse_period("{\"timelineObjects\": 5}"),
            Err(PeriodParseError::Json(_))
        ));
    }
}
