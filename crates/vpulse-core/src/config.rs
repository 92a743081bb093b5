//! Configuration management for vpulse
//!
//! Analysis settings come from several sources with precedence:
//! - Environment variables (`VPULSE__SECTION__KEY`)
//! - A config file named by `VPULSE_CONFIG`
//! - `./config/vpulse.{yaml,toml,json}`
//! - Built-in defaults
//!
//! Validation is soft. Questionable values produce warnings and fall back to
//! usable defaults instead of failing the run.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::series::SeriesMetric;
use crate::verdict::ClassificationPolicy;

/// Bucket width used when none (or zero) is configured.
pub const DEFAULT_BUCKET_WIDTH_SECS: u64 = 60;

/// Upper bound on time-series buckets; longer spans get wider buckets.
pub const DEFAULT_MAX_BUCKETS: usize = 10_000;

/// Histogram bin count used when none (or zero) is configured.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// Larger configured bin counts are clamped to this.
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// Error threshold applied by error-aware policies when none is configured.
pub const DEFAULT_ERROR_PERCENT: f64 = 2.0;

/// Root configuration for one analysis run.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub policy: ClassificationPolicy,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub series: SeriesConfig,

    #[serde(default)]
    pub histogram: HistogramConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

impl AnalysisConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by VPULSE_CONFIG env var
    /// 3. ./config/vpulse.{yaml,toml,json}
    /// 4. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("VPULSE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/vpulse").required(false));

        // Example: VPULSE__THRESHOLDS__GREEN_SECONDS=1.5
        builder = builder.add_source(
            Environment::with_prefix("VPULSE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("series.metrics")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("thresholds.green_seconds", 2.0)?
            .set_default("thresholds.amber_seconds", 5.0)?
            .set_default("policy", ClassificationPolicy::Avg.as_str())?
            .set_default("series.bucket_width_secs", DEFAULT_BUCKET_WIDTH_SECS)?
            .set_default("series.max_buckets", DEFAULT_MAX_BUCKETS as u64)?
            .set_default("histogram.bins", DEFAULT_HISTOGRAM_BINS as u64)?
            .set_default("profile.slow_run_ms", 1000)
    }

    /// Check configuration values and describe anything questionable.
    ///
    /// Nothing here is fatal; the returned warnings are meant to be logged
    /// while the run proceeds with the effective values.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let t = &self.thresholds;

        if !(t.green_seconds > 0.0) {
            warnings.push(format!(
                "thresholds.green_seconds should be > 0 (got {})",
                t.green_seconds
            ));
        }
        if t.amber_seconds < t.green_seconds {
            warnings.push(format!(
                "thresholds.amber_seconds ({}) is below green_seconds ({})",
                t.amber_seconds, t.green_seconds
            ));
        }
        if self.policy.is_error_aware() && t.error_percent.is_none() {
            warnings.push(format!(
                "policy `{}` needs thresholds.error_percent; using {DEFAULT_ERROR_PERCENT}%",
                self.policy
            ));
        }
        if self.series.bucket_width_secs == 0 {
            warnings.push(format!(
                "series.bucket_width_secs must be > 0; using {DEFAULT_BUCKET_WIDTH_SECS}"
            ));
        }
        if self.series.max_buckets < 2 {
            warnings.push(format!(
                "series.max_buckets must be >= 2 (got {}); using {DEFAULT_MAX_BUCKETS}",
                self.series.max_buckets
            ));
        }
        if self.series.metrics.is_empty() {
            warnings.push("series.metrics is empty; only throughput will be charted".to_string());
        }
        if self.histogram.bins == 0 {
            warnings.push(format!(
                "histogram.bins must be > 0; using {DEFAULT_HISTOGRAM_BINS}"
            ));
        } else if self.histogram.bins > MAX_HISTOGRAM_BINS {
            warnings.push(format!(
                "histogram.bins ({}) exceeds {MAX_HISTOGRAM_BINS}; clamping",
                self.histogram.bins
            ));
        }

        warnings
    }
}

/// Latency and error thresholds for classification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Values above this are at least AMBER.
    pub green_seconds: f64,

    /// Values above this are RED.
    pub amber_seconds: f64,

    /// Error percentage above which error-aware policies return RED.
    pub error_percent: Option<f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            green_seconds: 2.0,
            amber_seconds: 5.0,
            error_percent: None,
        }
    }
}

impl ThresholdConfig {
    /// Error threshold with the fallback applied.
    #[must_use]
    pub fn effective_error_percent(&self) -> f64 {
        self.error_percent.unwrap_or(DEFAULT_ERROR_PERCENT)
    }
}

/// Optional steady-state window, in raw epoch milliseconds.
///
/// Bounds stay as text so that invalid values can be ignored rather than
/// rejected.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Time-series settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SeriesConfig {
    /// Bucket width in seconds.
    pub bucket_width_secs: u64,

    /// Most buckets a series may hold before the width is widened.
    pub max_buckets: usize,

    /// Metrics computed per transaction and bucket.
    pub metrics: Vec<SeriesMetric>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            bucket_width_secs: DEFAULT_BUCKET_WIDTH_SECS,
            max_buckets: DEFAULT_MAX_BUCKETS,
            metrics: SeriesMetric::ALL.to_vec(),
        }
    }
}

impl SeriesConfig {
    /// Bucket width with the fallback applied.
    #[must_use]
    pub fn bucket_width(&self) -> Duration {
        let secs = if self.bucket_width_secs == 0 {
            DEFAULT_BUCKET_WIDTH_SECS
        } else {
            self.bucket_width_secs
        };
        Duration::from_secs(secs)
    }

    /// Bucket limit with the fallback applied.
    #[must_use]
    pub fn effective_max_buckets(&self) -> usize {
        if self.max_buckets < 2 {
            DEFAULT_MAX_BUCKETS
        } else {
            self.max_buckets
        }
    }
}

/// Latency histogram settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HistogramConfig {
    pub bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl HistogramConfig {
    /// Bin count with the fallback and upper clamp applied.
    #[must_use]
    pub fn effective_bins(&self) -> usize {
        if self.bins == 0 {
            DEFAULT_HISTOGRAM_BINS
        } else {
            self.bins.min(MAX_HISTOGRAM_BINS)
        }
    }
}

/// Run profiling settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Runs slower than this are logged as warnings.
    pub slow_run_ms: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self { slow_run_ms: 1000 }
    }
}

impl ProfileConfig {
    pub fn slow_run_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_run_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.thresholds.green_seconds, 2.0);
        assert_eq!(config.thresholds.amber_seconds, 5.0);
        assert_eq!(config.policy, ClassificationPolicy::Avg);
        assert_eq!(config.series.bucket_width(), Duration::from_secs(60));
        assert_eq!(config.series.metrics.len(), 5);
        assert_eq!(config.histogram.effective_bins(), 30);
        assert_eq!(config.series.effective_max_buckets(), 10_000);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_oversized_histogram_bins_are_clamped() {
        let mut config = AnalysisConfig::default();
        config.histogram.bins = 3_000_000_000;

        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("histogram.bins"));
        assert_eq!(config.histogram.effective_bins(), MAX_HISTOGRAM_BINS);

        config.histogram.bins = MAX_HISTOGRAM_BINS;
        assert!(config.validate().is_empty());
        assert_eq!(config.histogram.effective_bins(), MAX_HISTOGRAM_BINS);
    }

    #[test]
    fn test_tiny_max_buckets_falls_back() {
        let mut config = AnalysisConfig::default();
        config.series.max_buckets = 1;

        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("series.max_buckets"));
        assert_eq!(config.series.effective_max_buckets(), DEFAULT_MAX_BUCKETS);
    }

    #[test]
    fn test_validate_is_soft() {
        let mut config = AnalysisConfig::default();
        config.thresholds.green_seconds = 3.0;
        config.thresholds.amber_seconds = 1.0;
        config.policy = ClassificationPolicy::P90WithError;
        config.series.bucket_width_secs = 0;
        config.histogram.bins = 0;

        let warnings = config.validate();
        assert_eq!(warnings.len(), 4);
        assert_eq!(config.series.bucket_width(), Duration::from_secs(60));
        assert_eq!(config.histogram.effective_bins(), 30);
        assert_eq!(config.thresholds.effective_error_percent(), 2.0);
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "thresholds:\n  green_seconds: 1.5\n  error_percent: 10\n\
             policy: p90+error\n\
             window:\n  start: 1700000000000\n  end: \"1700000060000\"\n\
             series:\n  bucket_width_secs: 1\n  metrics: [mean, sample_count]"
        )
        .unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.thresholds.green_seconds, 1.5);
        assert_eq!(config.thresholds.amber_seconds, 5.0);
        assert_eq!(config.thresholds.error_percent, Some(10.0));
        assert_eq!(config.policy, ClassificationPolicy::P90WithError);
        assert_eq!(config.window.start.as_deref(), Some("1700000000000"));
        assert_eq!(config.window.end.as_deref(), Some("1700000060000"));
        assert_eq!(config.series.bucket_width(), Duration::from_secs(1));
        assert_eq!(
            config.series.metrics,
            vec![SeriesMetric::Mean, SeriesMetric::SampleCount]
        );
    }

    #[test]
    fn test_unknown_policy_in_file_falls_back() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "policy: median").unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.policy, ClassificationPolicy::Avg);
    }
}
