//! Time-bucketed series handed to chart renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-bucket statistic that can be requested for each transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    Mean,
    P90,
    P95,
    SampleCount,
    ErrorRate,
}

impl SeriesMetric {
    /// Every metric, in presentation order.
    pub const ALL: [SeriesMetric; 5] = [
        Self::Mean,
        Self::P90,
        Self::P95,
        Self::SampleCount,
        Self::ErrorRate,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::SampleCount => "sample_count",
            Self::ErrorRate => "error_rate",
        }
    }
}

impl FromStr for SeriesMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" => Ok(Self::Mean),
            "p90" => Ok(Self::P90),
            "p95" => Ok(Self::P95),
            "sample_count" | "samples" | "count" => Ok(Self::SampleCount),
            "error_rate" | "errors" => Ok(Self::ErrorRate),
            other => Err(format!("unknown series metric `{other}`")),
        }
    }
}

impl fmt::Display for SeriesMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values of one metric, one slot per bucket. `None` marks a bucket with no
/// samples and is distinct from a real zero.
pub type MetricSeries = Vec<Option<f64>>;

/// Bucketed view of a run.
///
/// Every sequence is aligned with `bucket_starts`/`labels`, which cover the
/// whole observed time range, including buckets with no records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Width of each bucket in milliseconds.
    pub bucket_width_ms: u64,
    /// Start instant of each bucket.
    pub bucket_starts: Vec<DateTime<Utc>>,
    /// Human-readable bucket labels.
    pub labels: Vec<String>,
    /// Transaction -> metric -> aligned values.
    pub transactions: BTreeMap<String, BTreeMap<SeriesMetric, MetricSeries>>,
    /// Records per bucket across all transactions.
    pub throughput: Vec<u64>,
    /// Error percentage per bucket across all transactions.
    pub error_trend: MetricSeries,
    /// Distinct thread identities per bucket. Absent when the log has no
    /// thread column.
    pub concurrency: Option<Vec<u64>>,
}

impl TimeSeries {
    /// Series with no buckets.
    #[must_use]
    pub fn empty(bucket_width_ms: u64) -> Self {
        Self {
            bucket_width_ms,
            bucket_starts: Vec::new(),
            labels: Vec::new(),
            transactions: BTreeMap::new(),
            throughput: Vec::new(),
            error_trend: Vec::new(),
            concurrency: None,
        }
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bucket_starts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bucket_starts.is_empty()
    }

    /// Values of `metric` for `transaction`, if requested and observed.
    #[must_use]
    pub fn values(&self, transaction: &str, metric: SeriesMetric) -> Option<&[Option<f64>]> {
        self.transactions
            .get(transaction)
            .and_then(|metrics| metrics.get(&metric))
            .map(Vec::as_slice)
    }

    /// Highest number of concurrent users seen in any bucket.
    #[must_use]
    pub fn peak_concurrency(&self) -> Option<u64> {
        self.concurrency
            .as_ref()
            .and_then(|counts| counts.iter().copied().max())
    }
}

/// Coarse steady-load estimate over the throughput sequence.
///
/// This compares the throughput standard deviation with 10% of the peak
/// throughput. It is a heuristic, not a statistical test, and should be
/// presented as approximate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteadyStateEstimate {
    /// Whether throughput looked stable.
    pub is_steady: bool,
    /// Sample standard deviation of per-bucket throughput.
    pub throughput_std_dev: Option<f64>,
    /// Threshold the deviation was compared against.
    pub threshold: Option<f64>,
}

impl SteadyStateEstimate {
    /// Estimate for runs with too little data to judge.
    #[must_use]
    pub const fn not_steady() -> Self {
        Self {
            is_steady: false,
            throughput_std_dev: None,
            threshold: None,
        }
    }
}
