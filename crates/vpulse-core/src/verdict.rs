//! Compliance verdicts and the policies that produce them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Three-level compliance verdict.
///
/// Variants are ordered by severity so `max` yields the worst verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rag {
    /// Compliant.
    Green,
    /// Degraded.
    Amber,
    /// Breach.
    Red,
}

impl Rag {
    /// Returns the canonical uppercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Amber => "AMBER",
            Self::Red => "RED",
        }
    }

    /// Reduces verdicts to the most severe one. An empty input is a
    /// vacuous pass.
    #[must_use]
    pub fn worst<I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = Rag>,
    {
        verdicts.into_iter().max().unwrap_or(Self::Green)
    }
}

impl fmt::Display for Rag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistic a policy compares against the latency thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisMetric {
    /// Arithmetic mean latency.
    Mean,
    /// 90th percentile latency.
    P90,
}

/// Rule used to map a transaction's metrics to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClassificationPolicy {
    /// Mean latency against the thresholds.
    #[default]
    Avg,
    /// 90th percentile latency against the thresholds.
    P90,
    /// Error rate override, then `Avg`.
    AvgWithError,
    /// Error rate override, then `P90`.
    P90WithError,
}

impl ClassificationPolicy {
    /// Returns the canonical policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::P90 => "p90",
            Self::AvgWithError => "avg+error",
            Self::P90WithError => "p90+error",
        }
    }

    /// Parses a policy name, falling back to `Avg` for anything unknown.
    ///
    /// The fallback is intentional: an unrecognized policy still yields a
    /// classification rather than failing the run.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|()| {
            warn!(policy = %name, fallback = "avg", "Unknown classification policy");
            Self::Avg
        })
    }

    /// Metric compared against the latency thresholds.
    #[must_use]
    pub const fn basis(&self) -> BasisMetric {
        match self {
            Self::Avg | Self::AvgWithError => BasisMetric::Mean,
            Self::P90 | Self::P90WithError => BasisMetric::P90,
        }
    }

    /// Whether the error threshold participates in classification.
    #[must_use]
    pub const fn is_error_aware(&self) -> bool {
        matches!(self, Self::AvgWithError | Self::P90WithError)
    }
}

impl FromStr for ClassificationPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avg" => Ok(Self::Avg),
            "p90" => Ok(Self::P90),
            "avg+error" => Ok(Self::AvgWithError),
            "p90+error" => Ok(Self::P90WithError),
            _ => Err(()),
        }
    }
}

impl From<String> for ClassificationPolicy {
    fn from(name: String) -> Self {
        Self::parse_lenient(&name)
    }
}

impl From<ClassificationPolicy> for String {
    fn from(policy: ClassificationPolicy) -> Self {
        policy.as_str().to_string()
    }
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of transactions per verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagCounts {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

impl RagCounts {
    /// Counts verdicts.
    pub fn tally<I>(verdicts: I) -> Self
    where
        I: IntoIterator<Item = Rag>,
    {
        let mut counts = Self::default();
        for verdict in verdicts {
            match verdict {
                Rag::Green => counts.green += 1,
                Rag::Amber => counts.amber += 1,
                Rag::Red => counts.red += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.green + self.amber + self.red
    }
}
