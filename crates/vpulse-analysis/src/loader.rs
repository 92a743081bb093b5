//! Record loading and normalization.
//!
//! Column names are matched ignoring case and whitespace. Rows missing a
//! usable timestamp, elapsed value or label are dropped without being
//! reported; only the aggregate [`LoadStats`] records how many went.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use vpulse_core::{NormalizedRecord, PulseError, PulseResult, RawRecord, DEFAULT_TRANSACTION};

const TIMESTAMP_COLUMNS: &[&str] = &["timestamp"];
const ELAPSED_COLUMNS: &[&str] = &["elapsed"];
const OUTCOME_COLUMNS: &[&str] = &["success"];
/// Label precedence: explicit label, then sampler name.
const LABEL_COLUMNS: &[&str] = &["label", "samplername", "sampler_name"];
const THREAD_COLUMNS: &[&str] = &["threadname", "thread_name"];

/// Wall-clock layouts accepted when a timestamp is not epoch milliseconds.
const WALL_CLOCK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Normalized records plus what the loader learned about the input.
#[derive(Debug, Clone, Default)]
pub struct LoadedLog {
    pub records: Vec<NormalizedRecord>,
    /// Whether the input carries thread identities at all.
    pub has_thread_column: bool,
    pub stats: LoadStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    pub rows_kept: usize,
}

impl LoadStats {
    #[must_use]
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

/// Anything that can produce a normalized record set.
pub trait RecordSource {
    fn load(self) -> PulseResult<LoadedLog>;
}

/// CSV log with a header row (e.g. a JMeter JTL file).
pub struct CsvLog<R> {
    reader: R,
}

impl CsvLog<File> {
    pub fn open(path: impl AsRef<Path>) -> PulseResult<Self> {
        Ok(Self {
            reader: File::open(path)?,
        })
    }
}

impl<R: Read> CsvLog<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> RecordSource for CsvLog<R> {
    fn load(self) -> PulseResult<LoadedLog> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(self.reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(PulseError::malformed("input has no header row"));
        }
        let layout = ColumnLayout::resolve(&headers);
        debug!(?layout, "Resolved log columns");

        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(layout.raw_record(&result?));
        }

        Ok(normalize_rows(rows, layout.thread.is_some()))
    }
}

/// Rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

impl RecordSource for RawTable {
    fn load(self) -> PulseResult<LoadedLog> {
        let has_thread_column = self.rows.iter().any(|row| row.thread_name.is_some());
        Ok(normalize_rows(self.rows, has_thread_column))
    }
}

/// Positions of the canonical columns within a header row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: Option<usize>,
    pub elapsed: Option<usize>,
    pub outcome: Option<usize>,
    pub label: Option<usize>,
    pub thread: Option<usize>,
}

impl ColumnLayout {
    pub fn resolve(headers: &StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(canonical_column_name).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|candidate| names.iter().position(|name| name == candidate))
        };

        Self {
            timestamp: find(TIMESTAMP_COLUMNS),
            elapsed: find(ELAPSED_COLUMNS),
            outcome: find(OUTCOME_COLUMNS),
            label: find(LABEL_COLUMNS),
            thread: find(THREAD_COLUMNS),
        }
    }

    /// Extracts the canonical fields of one row. A present column with a
    /// short row reads as an empty cell.
    pub fn raw_record(&self, row: &StringRecord) -> RawRecord {
        let cell = |idx: Option<usize>| idx.map(|i| row.get(i).unwrap_or_default().to_string());

        RawRecord {
            timestamp: cell(self.timestamp),
            elapsed: cell(self.elapsed),
            outcome: cell(self.outcome),
            label: cell(self.label),
            thread_name: cell(self.thread),
        }
    }
}

fn canonical_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalizes rows, dropping those that lack required fields.
pub fn normalize_rows(rows: Vec<RawRecord>, has_thread_column: bool) -> LoadedLog {
    let rows_read = rows.len();
    let records: Vec<NormalizedRecord> = rows.iter().filter_map(normalize).collect();
    let stats = LoadStats {
        rows_read,
        rows_kept: records.len(),
    };

    if stats.rows_dropped() > 0 {
        debug!(
            rows_read = stats.rows_read,
            rows_dropped = stats.rows_dropped(),
            "Dropped rows without usable timestamp, elapsed or label"
        );
    }

    LoadedLog {
        records,
        has_thread_column,
        stats,
    }
}

/// Converts one raw row, or `None` if a required field is unusable.
pub fn normalize(raw: &RawRecord) -> Option<NormalizedRecord> {
    let timestamp = parse_timestamp(raw.timestamp.as_deref()?)?;
    let elapsed_ms = parse_elapsed(raw.elapsed.as_deref()?)?;
    let transaction = match raw.label.as_deref() {
        None => DEFAULT_TRANSACTION.to_string(),
        Some(label) => {
            let label = label.trim();
            if label.is_empty() {
                return None;
            }
            label.to_string()
        }
    };

    Some(NormalizedRecord {
        timestamp,
        elapsed_ms: Some(elapsed_ms),
        succeeded: parse_outcome(raw.outcome.as_deref()),
        transaction,
        thread_name: raw
            .thread_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string),
    })
}

/// Parses epoch milliseconds or a wall-clock string (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms);
    }
    if let Ok(ms) = raw.parse::<f64>() {
        if !ms.is_finite() {
            return None;
        }
        return DateTime::from_timestamp_millis(ms.trunc() as i64);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    WALL_CLOCK_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parses elapsed milliseconds. NaN, infinite and negative values are
/// unusable.
pub fn parse_elapsed(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
}

/// `true`/`1` (any case) is success, anything else a failure. A missing
/// outcome column counts as success.
pub fn parse_outcome(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(value) => {
            let value = value.trim();
            value.eq_ignore_ascii_case("true") || value == "1"
        }
    }
}
