//! Analysis run profiling and slow run detection
//!
//! Each run records how long its stages took so a slow analysis can be
//! traced back to the stage responsible.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Stage timings for one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct RunProfile {
    /// Name of the analyzed source (file name or caller label)
    pub source: String,

    /// Run start timestamp (not serialized)
    #[serde(skip)]
    pub start_time: Instant,

    /// Individual stages with timing
    pub stages: Vec<ProfileStage>,

    /// Total run duration (set when finished)
    pub total_duration_us: Option<u64>,

    /// Whether this run was flagged as slow
    pub is_slow: bool,
}

/// A single profiled stage
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStage {
    /// Stage name (e.g., "load", "aggregate", "series")
    pub name: &'static str,

    /// Stage duration in microseconds
    pub duration_us: u64,

    /// Number of records the stage worked on
    pub records: usize,
}

impl RunProfile {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start_time: Instant::now(),
            stages: Vec::new(),
            total_duration_us: None,
            is_slow: false,
        }
    }

    /// Record a completed stage
    pub fn record_stage(&mut self, name: &'static str, duration: Duration, records: usize) {
        self.stages.push(ProfileStage {
            name,
            duration_us: duration.as_micros() as u64,
            records,
        });
    }

    /// Run `f` as a stage over `records` items and record its duration
    pub fn time<T>(&mut self, name: &'static str, records: usize, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let output = f();
        self.record_stage(name, started.elapsed(), records);
        output
    }

    /// Finish profiling and check for a slow run
    pub fn finish(mut self, slow_run_threshold: Duration) -> Self {
        let total = self.start_time.elapsed();
        let total_us = total.as_micros() as u64;
        self.total_duration_us = Some(total_us);
        self.is_slow = total > slow_run_threshold;

        if self.is_slow {
            warn!(
                source = %self.source,
                duration_us = total_us,
                threshold_ms = slow_run_threshold.as_millis() as u64,
                stages = ?self.stages,
                bottleneck = ?self.bottleneck().map(|s| s.name),
                "Slow analysis run"
            );
        } else {
            info!(
                source = %self.source,
                duration_us = total_us,
                "Analysis run completed"
            );
        }

        self
    }

    /// Identify the bottleneck stage (longest duration)
    pub fn bottleneck(&self) -> Option<&ProfileStage> {
        self.stages.iter().max_by_key(|s| s.duration_us)
    }

    pub fn total_duration(&self) -> Option<Duration> {
        self.total_duration_us.map(Duration::from_micros)
    }
}
