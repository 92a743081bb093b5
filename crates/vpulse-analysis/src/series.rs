//! Time-bucketed series for charting, throughput and concurrency.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, warn};
use vpulse_core::config::{DEFAULT_BUCKET_WIDTH_SECS, DEFAULT_MAX_BUCKETS};
use vpulse_core::{
    MetricSeries, NormalizedRecord, SeriesConfig, SeriesMetric, SteadyStateEstimate, TimeSeries,
};

use crate::stats::{sample_std_dev, LatencyStats};
use crate::window::detect_test_window;

/// Fewest throughput buckets for which steadiness is judged at all.
const STEADY_STATE_MIN_BUCKETS: usize = 4;

/// Fraction of peak throughput the deviation must stay under.
const STEADY_STATE_RATIO: f64 = 0.1;

/// Builds bucketed series independently of the per-transaction summaries.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    bucket_width_ms: i64,
    max_buckets: usize,
    metrics: Vec<SeriesMetric>,
}

impl SeriesBuilder {
    /// A zero width falls back to the default one-minute bucket.
    pub fn new(bucket_width: Duration, metrics: &[SeriesMetric]) -> Self {
        let mut bucket_width_ms = i64::try_from(bucket_width.as_millis()).unwrap_or(i64::MAX);
        if bucket_width_ms <= 0 {
            warn!(
                requested_ms = bucket_width_ms,
                fallback_secs = DEFAULT_BUCKET_WIDTH_SECS,
                "Bucket width too small"
            );
            bucket_width_ms = DEFAULT_BUCKET_WIDTH_SECS as i64 * 1000;
        }

        let mut unique = Vec::with_capacity(metrics.len());
        for metric in metrics {
            if !unique.contains(metric) {
                unique.push(*metric);
            }
        }

        Self {
            bucket_width_ms,
            max_buckets: DEFAULT_MAX_BUCKETS,
            metrics: unique,
        }
    }

    /// Caps the bucket axis. Limits below two fall back to the default.
    #[must_use]
    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = if max_buckets < 2 {
            DEFAULT_MAX_BUCKETS
        } else {
            max_buckets
        };
        self
    }

    pub fn from_config(config: &SeriesConfig) -> Self {
        Self::new(config.bucket_width(), &config.metrics)
            .with_max_buckets(config.effective_max_buckets())
    }

    pub fn bucket_width_ms(&self) -> i64 {
        self.bucket_width_ms
    }

    pub fn max_buckets(&self) -> usize {
        self.max_buckets
    }

    /// Width actually used for a run spanning `first_ms..=last_ms`.
    ///
    /// The configured width is multiplied until the axis fits in
    /// `max_buckets`, so widened buckets stay aligned to whole multiples of
    /// the configured width.
    fn effective_width(&self, first_ms: i64, last_ms: i64) -> i64 {
        let max = self.max_buckets as u64;
        let mut width = self.bucket_width_ms;
        let mut count = span_buckets(first_ms, last_ms, width);
        while count > max && width < i64::MAX {
            let factor = i64::try_from(count.div_ceil(max)).unwrap_or(i64::MAX).max(2);
            width = width.saturating_mul(factor);
            count = span_buckets(first_ms, last_ms, width);
        }

        if width != self.bucket_width_ms {
            warn!(
                requested_ms = self.bucket_width_ms,
                widened_ms = width,
                requested_buckets = span_buckets(first_ms, last_ms, self.bucket_width_ms),
                max_buckets = self.max_buckets,
                "Run spans too many buckets, widening"
            );
        }
        width
    }

    /// Buckets the records.
    ///
    /// The bucket axis spans from the bucket holding the earliest record to
    /// the bucket holding the latest, with no gaps. Concurrency is only
    /// produced when `has_thread_column` is set.
    pub fn build<'a, I>(&self, records: I, has_thread_column: bool) -> TimeSeries
    where
        I: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let records: Vec<&NormalizedRecord> = records.into_iter().collect();
        let Some((first_ms, last_ms)) = detect_test_window(records.iter().copied()) else {
            return TimeSeries::empty(self.bucket_width_ms as u64);
        };
        let width = self.effective_width(first_ms, last_ms);

        let origin = floor_to_bucket(first_ms, width);
        let bucket_count = ((floor_to_bucket(last_ms, width) - origin) / width) as usize + 1;
        let bucket_of = |ms: i64| ((floor_to_bucket(ms, width) - origin) / width) as usize;

        let mut cells: BTreeMap<&str, Vec<Vec<&NormalizedRecord>>> = BTreeMap::new();
        let mut throughput = vec![0u64; bucket_count];
        let mut failures = vec![0u64; bucket_count];
        let mut threads: Vec<HashSet<&str>> = vec![HashSet::new(); bucket_count];

        for &record in &records {
            let bucket = bucket_of(record.timestamp_millis());
            cells
                .entry(record.transaction.as_str())
                .or_insert_with(|| vec![Vec::new(); bucket_count])[bucket]
                .push(record);
            throughput[bucket] += 1;
            if !record.succeeded {
                failures[bucket] += 1;
            }
            if let Some(thread) = record.thread_name.as_deref() {
                threads[bucket].insert(thread);
            }
        }

        let transactions = cells
            .into_iter()
            .map(|(name, buckets)| {
                let stats: Vec<LatencyStats> = buckets
                    .iter()
                    .map(|cell| LatencyStats::from_records(cell.iter().copied()))
                    .collect();
                let metrics = self
                    .metrics
                    .iter()
                    .map(|&metric| {
                        let values: MetricSeries =
                            stats.iter().map(|s| metric_value(s, metric)).collect();
                        (metric, values)
                    })
                    .collect::<BTreeMap<SeriesMetric, MetricSeries>>();
                (name.to_string(), metrics)
            })
            .collect::<BTreeMap<_, _>>();

        let error_trend: MetricSeries = throughput
            .iter()
            .zip(&failures)
            .map(|(&total, &failed)| (total > 0).then(|| 100.0 * failed as f64 / total as f64))
            .collect();

        let concurrency: Option<Vec<u64>> = has_thread_column
            .then(|| threads.iter().map(|names| names.len() as u64).collect());

        let bucket_starts: Vec<DateTime<Utc>> = (0..bucket_count)
            .map(|i| DateTime::from_timestamp_millis(origin + i as i64 * width).unwrap_or_default())
            .collect();
        let format = label_format(width, &bucket_starts);
        let labels: Vec<String> = bucket_starts
            .iter()
            .map(|start| start.format(format).to_string())
            .collect();

        debug!(
            buckets = bucket_count,
            transactions = transactions.len(),
            width_ms = width,
            "Built time series"
        );

        TimeSeries {
            bucket_width_ms: width as u64,
            bucket_starts,
            labels,
            transactions,
            throughput,
            error_trend,
            concurrency,
        }
    }
}

fn floor_to_bucket(ms: i64, width: i64) -> i64 {
    ms.div_euclid(width) * width
}

fn span_buckets(first_ms: i64, last_ms: i64, width: i64) -> u64 {
    let span = floor_to_bucket(last_ms, width) - floor_to_bucket(first_ms, width);
    (span / width) as u64 + 1
}

fn metric_value(stats: &LatencyStats, metric: SeriesMetric) -> Option<f64> {
    match metric {
        SeriesMetric::Mean => stats.mean_seconds,
        SeriesMetric::P90 => stats.p90_seconds,
        SeriesMetric::P95 => stats.p95_seconds,
        SeriesMetric::SampleCount => Some(stats.sample_count as f64),
        SeriesMetric::ErrorRate => stats.error_rate_percent,
    }
}

/// Minute labels for whole-minute buckets, second labels otherwise; the date
/// is included once the axis crosses midnight.
fn label_format(width_ms: i64, bucket_starts: &[DateTime<Utc>]) -> &'static str {
    let whole_minutes = width_ms % 60_000 == 0;
    let multi_day = match (bucket_starts.first(), bucket_starts.last()) {
        (Some(first), Some(last)) => first.date_naive() != last.date_naive(),
        _ => false,
    };

    match (multi_day, whole_minutes) {
        (false, true) => "%H:%M",
        (false, false) => "%H:%M:%S",
        (true, true) => "%Y-%m-%d %H:%M",
        (true, false) => "%Y-%m-%d %H:%M:%S",
    }
}

/// Judges whether throughput was stable.
///
/// Steady when the sample standard deviation of per-bucket throughput is
/// below 10% of the peak. Runs with fewer than four buckets are never
/// considered steady.
pub fn steady_state(throughput: &[u64]) -> SteadyStateEstimate {
    if throughput.len() < STEADY_STATE_MIN_BUCKETS {
        return SteadyStateEstimate::not_steady();
    }

    let values: Vec<f64> = throughput.iter().map(|&count| count as f64).collect();
    let peak = values.iter().copied().fold(0.0, f64::max);
    let Some(std_dev) = sample_std_dev(&values) else {
        return SteadyStateEstimate::not_steady();
    };
    let threshold = STEADY_STATE_RATIO * peak;

    SteadyStateEstimate {
        is_steady: std_dev < threshold,
        throughput_std_dev: Some(std_dev),
        threshold: Some(threshold),
    }
}
