//! Response-time distribution.

use vpulse_core::config::MAX_HISTOGRAM_BINS;
use vpulse_core::{LatencyHistogram, NormalizedRecord, ThresholdConfig};

/// Bins elapsed milliseconds into `bins` equal-width buckets over the
/// observed range. The last bin is closed so the maximum is counted. When
/// every value is identical the range is widened by half a millisecond on
/// each side. Bin counts above [`MAX_HISTOGRAM_BINS`] are clamped.
pub fn latency_histogram<'a, I>(
    records: I,
    bins: usize,
    thresholds: &ThresholdConfig,
) -> LatencyHistogram
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let values: Vec<f64> = records
        .into_iter()
        .filter_map(|record| record.elapsed_ms)
        .filter(|ms| ms.is_finite())
        .collect();

    let mut histogram = LatencyHistogram {
        edges_ms: Vec::new(),
        counts: Vec::new(),
        green_marker_ms: thresholds.green_seconds * 1000.0,
        amber_marker_ms: thresholds.amber_seconds * 1000.0,
    };
    if values.is_empty() || bins == 0 {
        return histogram;
    }
    let bins = bins.min(MAX_HISTOGRAM_BINS);

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (high - low) / bins as f64;

    histogram.edges_ms = (0..=bins)
        .map(|i| if i == bins { high } else { low + i as f64 * width })
        .collect();
    histogram.counts = vec![0; bins];
    for value in values {
        let bin = (((value - low) / width) as usize).min(bins - 1);
        histogram.counts[bin] += 1;
    }

    histogram
}
