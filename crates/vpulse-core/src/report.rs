//! Output of one analysis run, as handed to presentation layers.

use serde::{Deserialize, Serialize};

use crate::series::{SteadyStateEstimate, TimeSeries};
use crate::summary::TransactionSummary;
use crate::verdict::{ClassificationPolicy, Rag, RagCounts};

/// Whether the run had any usable records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataStatus {
    /// At least one record survived normalization and filtering.
    Complete,
    /// Every row was dropped; all outputs are empty. Presentation layers
    /// render a "no data" state instead of failing.
    Insufficient,
}

/// Equal-width histogram of elapsed milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyHistogram {
    /// Bin edges, `counts.len() + 1` entries when non-empty.
    pub edges_ms: Vec<f64>,
    /// Samples per bin; the last bin includes its upper edge.
    pub counts: Vec<u64>,
    /// Green threshold in milliseconds, for chart markers.
    pub green_marker_ms: f64,
    /// Amber threshold in milliseconds, for chart markers.
    pub amber_marker_ms: f64,
}

impl LatencyHistogram {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total samples across all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Complete result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub status: DataStatus,
    /// Policy the verdicts were computed with.
    pub policy: ClassificationPolicy,
    /// One entry per transaction, ordered by name.
    pub summaries: Vec<TransactionSummary>,
    /// Worst verdict across all transactions.
    pub overall: Rag,
    pub rag_counts: RagCounts,
    pub series: TimeSeries,
    pub steady_state: SteadyStateEstimate,
    /// `HH:MM–HH:MM` span of the run, `N/A` when empty.
    pub test_period: String,
    /// Whole seconds between the first and last record.
    pub total_duration_secs: Option<u64>,
    pub peak_concurrent_users: Option<u64>,
    pub histogram: LatencyHistogram,
    /// First and last epoch-millisecond timestamps after filtering.
    pub test_window_ms: Option<(i64, i64)>,
}

impl AnalysisReport {
    /// Duration as `<n>s`, `N/A` when the run has no measurable span.
    #[must_use]
    pub fn display_total_duration(&self) -> String {
        match self.total_duration_secs {
            Some(secs) if secs > 0 => format!("{secs}s"),
            _ => "N/A".to_string(),
        }
    }

    /// Whether the report carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status == DataStatus::Insufficient
    }
}
