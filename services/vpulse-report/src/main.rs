use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vpulse_analysis::Analyzer;
use vpulse_core::{AnalysisConfig, ClassificationPolicy, SeriesMetric};

mod render;

use render::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "vpulse-report")]
#[command(about = "Load-test log metrics and RAG compliance report", long_about = None)]
#[command(version)]
struct Cli {
    /// Load-test log (CSV with a header row, e.g. a JMeter JTL file)
    #[arg(long)]
    file: PathBuf,

    /// Configuration file (defaults to VPULSE_CONFIG or ./config/vpulse.*)
    #[arg(long, env = "VPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Green latency threshold in seconds
    #[arg(long)]
    green: Option<f64>,

    /// Amber latency threshold in seconds
    #[arg(long)]
    amber: Option<f64>,

    /// Classification policy: avg, p90, avg+error, p90+error
    #[arg(long)]
    policy: Option<String>,

    /// Error-rate threshold in percent for error-aware policies
    #[arg(long)]
    error_threshold: Option<f64>,

    /// Window start in epoch milliseconds
    #[arg(long)]
    start: Option<String>,

    /// Window end in epoch milliseconds
    #[arg(long)]
    end: Option<String>,

    /// Time-series bucket width in seconds
    #[arg(long)]
    bucket_secs: Option<u64>,

    /// Comma-separated series metrics (mean, p90, p95, sample_count, error_rate)
    #[arg(long, value_delimiter = ',')]
    metrics: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown")]
    format: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    let args = Cli::parse();

    info!("Starting vpulse report");
    info!("File: {}", args.file.display());

    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::load()?,
    };
    apply_overrides(&mut config, &args)?;
    info!("Policy: {}", config.policy);
    info!("Bucket width: {}s", config.series.bucket_width().as_secs());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Analyzing {}", args.file.display()));

    let analyzer = Analyzer::new(config);
    let result = analyzer.analyze_path(&args.file);
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\n❌ Analysis failed: {}", e);
            return Err(e.into());
        }
    };

    let source = args
        .file
        .file_name()
        .map_or_else(|| args.file.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        });

    match &args.output {
        Some(path) => {
            render::write_report(&report, &source, path, args.format)?;
            eprintln!("\n✅ Report written to {}", path.display());
            eprintln!("  Overall verdict: {}", report.overall);
            eprintln!("  Transactions: {}", report.summaries.len());
        }
        None => println!("{}", render::render(&report, &source, args.format)?),
    }

    Ok(())
}

/// Apply command-line flags on top of file and environment configuration
fn apply_overrides(config: &mut AnalysisConfig, args: &Cli) -> Result<(), String> {
    if let Some(green) = args.green {
        config.thresholds.green_seconds = green;
    }
    if let Some(amber) = args.amber {
        config.thresholds.amber_seconds = amber;
    }
    if let Some(policy) = &args.policy {
        config.policy = ClassificationPolicy::parse_lenient(policy);
    }
    if let Some(error_threshold) = args.error_threshold {
        config.thresholds.error_percent = Some(error_threshold);
    }
    if args.start.is_some() || args.end.is_some() {
        config.window.start = args.start.clone();
        config.window.end = args.end.clone();
    }
    if let Some(bucket_secs) = args.bucket_secs {
        config.series.bucket_width_secs = bucket_secs;
    }
    if !args.metrics.is_empty() {
        config.series.metrics = args
            .metrics
            .iter()
            .map(|name| name.parse::<SeriesMetric>())
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(())
}

/// Initialize logging
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
