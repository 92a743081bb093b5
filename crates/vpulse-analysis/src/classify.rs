//! Compliance classification.

use vpulse_core::{
    AnalysisConfig, BasisMetric, ClassificationPolicy, Rag, ThresholdConfig, TransactionSummary,
};

/// Maps transaction summaries to verdicts under one policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    policy: ClassificationPolicy,
    green_seconds: f64,
    amber_seconds: f64,
    error_percent: f64,
}

impl Classifier {
    pub fn new(policy: ClassificationPolicy, thresholds: &ThresholdConfig) -> Self {
        Self {
            policy,
            green_seconds: thresholds.green_seconds,
            amber_seconds: thresholds.amber_seconds,
            error_percent: thresholds.effective_error_percent(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.policy, &config.thresholds)
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    /// Classifies one summary from its full-precision metrics.
    ///
    /// Thresholds are exclusive: a value equal to the green threshold is
    /// GREEN, equal to the amber threshold is AMBER. A summary without the
    /// basis metric cannot demonstrate compliance and is RED.
    pub fn classify(&self, summary: &TransactionSummary) -> Rag {
        if self.policy.is_error_aware() && summary.error_rate_percent > self.error_percent {
            return Rag::Red;
        }

        let basis = match self.policy.basis() {
            BasisMetric::Mean => summary.mean_seconds,
            BasisMetric::P90 => summary.p90_seconds,
        };

        match basis {
            None => Rag::Red,
            Some(value) if value > self.amber_seconds => Rag::Red,
            Some(value) if value > self.green_seconds => Rag::Amber,
            Some(_) => Rag::Green,
        }
    }

    /// Attaches a verdict to every summary and returns the overall verdict.
    pub fn classify_all(&self, summaries: &mut [TransactionSummary]) -> Rag {
        for summary in summaries.iter_mut() {
            summary.verdict = Some(self.classify(summary));
        }
        overall_verdict(summaries)
    }
}

/// Worst attached verdict; GREEN when there are no verdicts.
pub fn overall_verdict(summaries: &[TransactionSummary]) -> Rag {
    Rag::worst(summaries.iter().filter_map(|summary| summary.verdict))
}
