//! Load-test log analysis: loading, window filtering, per-transaction
//! aggregation, RAG classification and time-series bucketing.

pub mod aggregate;
pub mod classify;
pub mod distribution;
pub mod engine;
pub mod loader;
pub mod profile;
pub mod series;
pub mod stats;
pub mod window;

pub use aggregate::aggregate;
pub use classify::{overall_verdict, Classifier};
pub use distribution::latency_histogram;
pub use engine::Analyzer;
pub use loader::{CsvLog, LoadStats, LoadedLog, RawTable, RecordSource};
pub use profile::{ProfileStage, RunProfile};
pub use series::{steady_state, SeriesBuilder};
pub use stats::{percentile, LatencyStats};
pub use window::{detect_test_window, filter_window, TimeWindow};
