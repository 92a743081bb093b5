//! Analysis engine: runs every stage over one record set and assembles the
//! report handed to presentation layers.

use chrono::DateTime;
use std::path::Path;
use tracing::{debug, info, warn};
use vpulse_core::{
    AnalysisConfig, AnalysisReport, DataStatus, NormalizedRecord, PulseResult, RagCounts,
};

use crate::aggregate::aggregate;
use crate::classify::Classifier;
use crate::distribution::latency_histogram;
use crate::loader::{CsvLog, LoadedLog, RecordSource};
use crate::profile::RunProfile;
use crate::series::{steady_state, SeriesBuilder};
use crate::window::{detect_test_window, filter_window, TimeWindow};

/// Runs analyses under one configuration.
///
/// The configuration is fixed for the lifetime of the analyzer; callers
/// wanting different thresholds or windows build another one.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    classifier: Classifier,
    series: SeriesBuilder,
    window: Option<TimeWindow>,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        for warning in config.validate() {
            warn!(%warning, "Configuration warning");
        }

        let window = TimeWindow::from_config(&config.window);
        if window.is_none() && (config.window.start.is_some() || config.window.end.is_some()) {
            debug!(
                start = ?config.window.start,
                end = ?config.window.end,
                "Window bounds unusable, analyzing full run"
            );
        }

        Self {
            classifier: Classifier::from_config(&config),
            series: SeriesBuilder::from_config(&config.series),
            window,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Loads a CSV log from disk and analyzes it.
    pub fn analyze_path(&self, path: impl AsRef<Path>) -> PulseResult<AnalysisReport> {
        let path = path.as_ref();
        self.analyze_source(CsvLog::open(path)?, path.display().to_string())
    }

    /// Loads records from any source and analyzes them.
    ///
    /// Malformed input is the only failure; a log whose rows are all
    /// dropped yields an [`DataStatus::Insufficient`] report.
    pub fn analyze_source<S: RecordSource>(
        &self,
        source: S,
        name: impl Into<String>,
    ) -> PulseResult<AnalysisReport> {
        let mut profile = RunProfile::new(name);
        let loaded: LoadedLog = profile.time("load", 0, || source.load())?;

        info!(
            source = %profile.source,
            rows_read = loaded.stats.rows_read,
            rows_kept = loaded.stats.rows_kept,
            rows_dropped = loaded.stats.rows_dropped(),
            "Loaded log"
        );

        Ok(self.run(&loaded.records, loaded.has_thread_column, profile))
    }

    /// Analyzes records that are already normalized.
    pub fn analyze_records(
        &self,
        records: &[NormalizedRecord],
        has_thread_column: bool,
    ) -> AnalysisReport {
        self.run(records, has_thread_column, RunProfile::new("records"))
    }

    fn run(
        &self,
        records: &[NormalizedRecord],
        has_thread_column: bool,
        mut profile: RunProfile,
    ) -> AnalysisReport {
        let filtered = profile.time("filter", records.len(), || {
            filter_window(records, self.window)
        });
        let kept = filtered.len();
        if let Some(window) = self.window {
            debug!(
                start_ms = window.start_ms(),
                end_ms = window.end_ms(),
                before = records.len(),
                after = kept,
                "Applied window"
            );
        }

        let mut summaries = profile.time("aggregate", kept, || {
            aggregate(filtered.iter().copied())
        });

        let overall = profile.time("classify", summaries.len(), || {
            self.classifier.classify_all(&mut summaries)
        });
        let rag_counts = RagCounts::tally(summaries.iter().filter_map(|s| s.verdict));

        let series = profile.time("series", kept, || {
            self.series.build(filtered.iter().copied(), has_thread_column)
        });
        let steady = steady_state(&series.throughput);

        let histogram = profile.time("distribution", kept, || {
            latency_histogram(
                filtered.iter().copied(),
                self.config.histogram.effective_bins(),
                &self.config.thresholds,
            )
        });

        let test_window_ms = detect_test_window(filtered.iter().copied());
        let status = if kept == 0 {
            DataStatus::Insufficient
        } else {
            DataStatus::Complete
        };

        let profile = profile.finish(self.config.profile.slow_run_threshold());
        info!(
            source = %profile.source,
            ?status,
            transactions = summaries.len(),
            %overall,
            buckets = series.len(),
            bottleneck = ?profile.bottleneck().map(|stage| stage.name),
            "Analysis finished"
        );

        AnalysisReport {
            status,
            policy: self.classifier.policy(),
            overall,
            rag_counts,
            peak_concurrent_users: series.peak_concurrency(),
            steady_state: steady,
            test_period: test_period(test_window_ms),
            total_duration_secs: test_window_ms
                .map(|(first, last)| ((last - first) / 1000) as u64),
            histogram,
            test_window_ms,
            summaries,
            series,
        }
    }
}

/// `HH:MM–HH:MM` for the first and last timestamps, `N/A` without data.
fn test_period(window: Option<(i64, i64)>) -> String {
    let Some((first, last)) = window else {
        return "N/A".to_string();
    };
    match (
        DateTime::from_timestamp_millis(first),
        DateTime::from_timestamp_millis(last),
    ) {
        (Some(start), Some(end)) => {
            format!("{}–{}", start.format("%H:%M"), end.format("%H:%M"))
        }
        _ => "N/A".to_string(),
    }
}
