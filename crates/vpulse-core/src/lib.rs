//! Core domain types for vpulse load-test analysis.

pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod series;
pub mod summary;
pub mod verdict;

pub use config::{
    AnalysisConfig, HistogramConfig, ProfileConfig, SeriesConfig, ThresholdConfig, WindowConfig,
};
pub use error::{PulseError, PulseResult};
pub use record::{NormalizedRecord, RawRecord, DEFAULT_TRANSACTION};
pub use report::{AnalysisReport, DataStatus, LatencyHistogram};
pub use series::{MetricSeries, SeriesMetric, SteadyStateEstimate, TimeSeries};
pub use summary::{format_seconds, TransactionSummary, DISPLAY_PRECISION};
pub use verdict::{BasisMetric, ClassificationPolicy, Rag, RagCounts};
