//! Shared latency statistics.
//!
//! The aggregator and the series builder both compute their numbers through
//! [`LatencyStats::from_records`], so summary rows and chart buckets can
//! never disagree on how a mean or percentile is defined.

use vpulse_core::NormalizedRecord;

const MS_PER_SECOND: f64 = 1000.0;

/// Statistics over one group of records (a transaction, or one bucket of it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub sample_count: usize,
    pub mean_seconds: Option<f64>,
    pub p90_seconds: Option<f64>,
    pub p95_seconds: Option<f64>,
    /// `None` only for an empty group.
    pub error_rate_percent: Option<f64>,
}

impl LatencyStats {
    /// Computes statistics for a group of records.
    ///
    /// Records without a usable elapsed value are left out of the mean's
    /// numerator and of the percentiles, but still count towards
    /// `sample_count` and therefore the mean's denominator: failed requests
    /// are part of the offered load. A group where no elapsed value is usable
    /// has no latency metrics at all.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let mut sample_count = 0usize;
        let mut failures = 0usize;
        let mut elapsed_ms = Vec::new();

        for record in records {
            sample_count += 1;
            if !record.succeeded {
                failures += 1;
            }
            if let Some(ms) = record.elapsed_ms.filter(|ms| ms.is_finite()) {
                elapsed_ms.push(ms);
            }
        }

        if sample_count == 0 {
            return Self {
                sample_count,
                mean_seconds: None,
                p90_seconds: None,
                p95_seconds: None,
                error_rate_percent: None,
            };
        }

        elapsed_ms.sort_by(f64::total_cmp);
        let mean_ms = if elapsed_ms.is_empty() {
            None
        } else {
            Some(elapsed_ms.iter().sum::<f64>() / sample_count as f64)
        };

        Self {
            sample_count,
            mean_seconds: mean_ms.map(ms_to_seconds),
            p90_seconds: percentile(&elapsed_ms, 0.90).map(ms_to_seconds),
            p95_seconds: percentile(&elapsed_ms, 0.95).map(ms_to_seconds),
            error_rate_percent: Some(100.0 * failures as f64 / sample_count as f64),
        }
    }
}

fn ms_to_seconds(ms: f64) -> f64 {
    ms / MS_PER_SECOND
}

/// Linearly interpolated percentile over sorted data.
///
/// The rank is `quantile * (n - 1)`; fractional ranks interpolate between
/// the two neighbouring values.
pub fn percentile(sorted: &[f64], quantile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let pos = quantile.clamp(0.0, 1.0) * (sorted.len() as f64 - 1.0);
    let low = pos.floor() as usize;
    let high = pos.ceil() as usize;

    if low == high {
        Some(sorted[low])
    } else {
        let weight = pos - low as f64;
        Some(sorted[low] + (sorted[high] - sorted[low]) * weight)
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
