//! Report rendering for analysis results

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use vpulse_core::{AnalysisReport, PulseResult};

/// Report format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Markdown,
    Json,
}

/// Render a report in the requested format
pub fn render(report: &AnalysisReport, source: &str, format: ReportFormat) -> PulseResult<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(report, source)),
        ReportFormat::Json => render_json(report),
    }
}

/// Write a rendered report to file
pub fn write_report(
    report: &AnalysisReport,
    source: &str,
    path: impl AsRef<Path>,
    format: ReportFormat,
) -> PulseResult<()> {
    let content = render(report, source, format)?;
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Full report as pretty-printed JSON
pub fn render_json(report: &AnalysisReport) -> PulseResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Generate Markdown report
pub fn render_markdown(report: &AnalysisReport, source: &str) -> String {
    let mut out = format!("# Load Test Report: {source}\n\n");

    if report.is_empty() {
        out.push_str("**Status**: no usable records\n\n");
        out.push_str("Every row was dropped while loading or fell outside the window.\n");
        return out;
    }

    let _ = write!(
        out,
        r#"**Overall**: {}

---

## Summary

- **Test Period**: {}
- **Total Duration**: {}
- **Policy**: {}
- **Peak Concurrent Users**: {}
- **Verdicts**: {} green, {} amber, {} red

---

## Transactions

| Transaction | Samples | Avg (s) | P90 (s) | P95 (s) | Error % | RAG |
|-------------|---------|---------|---------|---------|---------|-----|
"#,
        report.overall,
        report.test_period,
        report.display_total_duration(),
        report.policy,
        report
            .peak_concurrent_users
            .map_or_else(|| "N/A".to_string(), |users| users.to_string()),
        report.rag_counts.green,
        report.rag_counts.amber,
        report.rag_counts.red,
    );

    for summary in &report.summaries {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            summary.name,
            summary.sample_count,
            summary.display_mean(),
            summary.display_p90(),
            summary.display_p95(),
            summary.display_error_rate(),
            summary.display_verdict(),
        );
    }

    out.push_str("\n---\n\n## Throughput\n\n");
    let series = &report.series;
    match &series.concurrency {
        Some(_) => {
            out.push_str("| Bucket | Requests | Error % | Users |\n");
            out.push_str("|--------|----------|---------|-------|\n");
        }
        None => {
            out.push_str("| Bucket | Requests | Error % |\n");
            out.push_str("|--------|----------|---------|\n");
        }
    }
    for (i, label) in series.labels.iter().enumerate() {
        let error = series
            .error_trend
            .get(i)
            .copied()
            .flatten()
            .map_or_else(|| "N/A".to_string(), |rate| format!("{rate:.2}"));
        let requests = series.throughput.get(i).copied().unwrap_or_default();
        match &series.concurrency {
            Some(users) => {
                let _ = writeln!(
                    out,
                    "| {label} | {requests} | {error} | {} |",
                    users.get(i).copied().unwrap_or_default()
                );
            }
            None => {
                let _ = writeln!(out, "| {label} | {requests} | {error} |");
            }
        }
    }

    let steady = &report.steady_state;
    let verdict = if steady.is_steady { "steady" } else { "not steady" };
    let _ = write!(out, "\n**Load (approximate)**: {verdict}");
    if let (Some(std_dev), Some(threshold)) = (steady.throughput_std_dev, steady.threshold) {
        let _ = write!(
            out,
            " (throughput std dev {std_dev:.2} against threshold {threshold:.2})"
        );
    }
    out.push('\n');

    out
}
