use serde::{Deserialize, Serialize};

use crate::verdict::Rag;

/// Decimal places used when durations and percentages are displayed.
pub const DISPLAY_PRECISION: usize = 2;

/// Per-transaction statistics for one analysis run.
///
/// Metrics are kept at full precision; classification reads these fields
/// directly. The `display_*` helpers produce the rounded presentation
/// strings and must never feed back into classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction name.
    pub name: String,
    /// Number of records in the partition (always >= 1).
    pub sample_count: usize,
    /// Mean latency in seconds, `None` when no elapsed value was usable.
    pub mean_seconds: Option<f64>,
    /// Interpolated 90th percentile latency in seconds.
    pub p90_seconds: Option<f64>,
    /// Interpolated 95th percentile latency in seconds.
    pub p95_seconds: Option<f64>,
    /// Failed records as a percentage of `sample_count` (0-100).
    pub error_rate_percent: f64,
    /// Verdict, attached once by the classifier.
    pub verdict: Option<Rag>,
}

impl TransactionSummary {
    #[must_use]
    pub fn display_mean(&self) -> String {
        format_seconds(self.mean_seconds)
    }

    #[must_use]
    pub fn display_p90(&self) -> String {
        format_seconds(self.p90_seconds)
    }

    #[must_use]
    pub fn display_p95(&self) -> String {
        format_seconds(self.p95_seconds)
    }

    #[must_use]
    pub fn display_error_rate(&self) -> String {
        format!("{:.*}", DISPLAY_PRECISION, self.error_rate_percent)
    }

    /// Verdict label, `-` before classification.
    #[must_use]
    pub fn display_verdict(&self) -> &'static str {
        self.verdict.map_or("-", |rag| rag.as_str())
    }
}

/// Formats an optional duration with the display precision, `N/A` if absent.
#[must_use]
pub fn format_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.*}", DISPLAY_PRECISION, v),
        None => "N/A".to_string(),
    }
}
