//! Load-test log records before and after normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction name used when the log carries no label column at all.
pub const DEFAULT_TRANSACTION: &str = "ALL";

/// One row of the input log, as text.
///
/// `None` means the column does not exist in the input; `Some("")` means the
/// column exists but the cell is empty. The distinction matters for the
/// outcome column (absent defaults to success, empty is a failure) and the
/// label column (absent falls back to [`DEFAULT_TRANSACTION`], empty drops
/// the row).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Epoch milliseconds or a wall-clock string.
    pub timestamp: Option<String>,
    /// Elapsed time in milliseconds.
    pub elapsed: Option<String>,
    /// Success flag (`true`/`1` mean success).
    pub outcome: Option<String>,
    /// Transaction label.
    pub label: Option<String>,
    /// Virtual user identity.
    pub thread_name: Option<String>,
}

/// A validated record with canonical fields.
///
/// Elapsed time stays in the log's milliseconds; the aggregation stages
/// convert it to seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Absolute instant the request started.
    pub timestamp: DateTime<Utc>,
    /// Elapsed milliseconds, `None` when the value was not usable.
    pub elapsed_ms: Option<f64>,
    /// Outcome of the request.
    pub succeeded: bool,
    /// Transaction (unit under test) the record belongs to.
    pub transaction: String,
    /// Virtual user identity, if the log carries one.
    pub thread_name: Option<String>,
}

impl NormalizedRecord {
    /// Creates a successful record without thread identity.
    #[must_use]
    pub fn new(
        timestamp: DateTime<Utc>,
        elapsed_ms: Option<f64>,
        transaction: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            elapsed_ms,
            succeeded: true,
            transaction: transaction.into(),
            thread_name: None,
        }
    }

    /// Sets the outcome (builder pattern).
    #[must_use]
    pub fn with_outcome(mut self, succeeded: bool) -> Self {
        self.succeeded = succeeded;
        self
    }

    /// Sets the thread identity (builder pattern).
    #[must_use]
    pub fn with_thread(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    /// Timestamp in epoch milliseconds, the unit of window bounds.
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_record_builder() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let record = NormalizedRecord::new(ts, Some(250.0), "Login")
            .with_outcome(false)
            .with_thread("Thread Group 1-1");

        assert_eq!(record.transaction, "Login");
        assert!(!record.succeeded);
        assert_eq!(record.thread_name.as_deref(), Some("Thread Group 1-1"));
        assert_eq!(record.timestamp_millis(), 1_700_000_000_123);
    }
}
