//! Steady-state window filtering.

use tracing::debug;
use vpulse_core::{NormalizedRecord, WindowConfig};

/// Inclusive interval of epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start_ms: i64,
    end_ms: i64,
}

impl TimeWindow {
    /// Creates a window, or `None` when `start > end`.
    pub fn new(start_ms: i64, end_ms: i64) -> Option<Self> {
        (start_ms <= end_ms).then_some(Self { start_ms, end_ms })
    }

    /// Builds a window from raw bounds. Missing, non-numeric or inverted
    /// bounds yield `None`, which callers treat as "no filtering".
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let (Some(start), Some(end)) = (start, end) else {
            return None;
        };
        match (start.trim().parse::<i64>(), end.trim().parse::<i64>()) {
            (Ok(start_ms), Ok(end_ms)) => {
                let window = Self::new(start_ms, end_ms);
                if window.is_none() {
                    debug!(start_ms, end_ms, "Ignoring inverted window");
                }
                window
            }
            _ => {
                debug!(start, end, "Ignoring non-numeric window bounds");
                None
            }
        }
    }

    pub fn from_config(config: &WindowConfig) -> Option<Self> {
        Self::from_bounds(config.start.as_deref(), config.end.as_deref())
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&timestamp_ms)
    }
}

/// Restricts records to the window. Without a window every record passes.
pub fn filter_window(
    records: &[NormalizedRecord],
    window: Option<TimeWindow>,
) -> Vec<&NormalizedRecord> {
    match window {
        Some(window) => records
            .iter()
            .filter(|record| window.contains(record.timestamp_millis()))
            .collect(),
        None => records.iter().collect(),
    }
}

/// First and last timestamps in epoch milliseconds.
pub fn detect_test_window<'a, I>(records: I) -> Option<(i64, i64)>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    records
        .into_iter()
        .map(NormalizedRecord::timestamp_millis)
        .fold(None, |acc, ts| match acc {
            None => Some((ts, ts)),
            Some((min, max)) => Some((min.min(ts), max.max(ts))),
        })
}
