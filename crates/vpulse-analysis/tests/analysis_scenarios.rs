//! End-to-end analysis scenarios driven through the CSV loader

use std::io::Write;

use tempfile::NamedTempFile;
use vpulse_analysis::Analyzer;
use vpulse_core::{
    AnalysisConfig, ClassificationPolicy, DataStatus, PulseError, Rag, SeriesMetric,
};

/// 2023-11-14 22:14:00 UTC
const BASE_MS: i64 = 1_700_000_040_000;

const JTL_HEADER: &str = "timeStamp,elapsed,label,responseCode,threadName,success";

fn write_log(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{JTL_HEADER}").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn row(offset_ms: i64, elapsed: u64, label: &str, thread: &str, success: bool) -> String {
    format!("{},{elapsed},{label},200,{thread},{success}", BASE_MS + offset_ms)
}

fn scenario_a_log() -> NamedTempFile {
    write_log(&[
        row(0, 1000, "Login", "TG 1-1", true),
        row(0, 3000, "Login", "TG 1-2", false),
    ])
}

#[test]
fn test_scenario_a_boundary_mean_is_green() {
    let log = scenario_a_log();
    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(log.path())
        .unwrap();

    assert_eq!(report.summaries.len(), 1);
    let login = &report.summaries[0];
    assert_eq!(login.name, "Login");
    assert_eq!(login.sample_count, 2);
    assert_eq!(login.mean_seconds, Some(2.0));
    assert_eq!(login.error_rate_percent, 50.0);
    assert_eq!(login.verdict, Some(Rag::Green));
    assert_eq!(report.overall, Rag::Green);
}

#[test]
fn test_scenario_b_error_rate_overrides_latency() {
    let log = scenario_a_log();
    let mut config = AnalysisConfig::default();
    config.policy = ClassificationPolicy::AvgWithError;
    config.thresholds.error_percent = Some(10.0);

    let report = Analyzer::new(config).analyze_path(log.path()).unwrap();

    assert_eq!(report.summaries[0].verdict, Some(Rag::Red));
    assert_eq!(report.overall, Rag::Red);
    assert_eq!(report.rag_counts.red, 1);
}

#[test]
fn test_scenario_c_no_usable_rows() {
    let log = write_log(&[
        "not-a-time,100,Login,200,TG 1-1,true".to_string(),
        format!("{},,Login,200,TG 1-1,true", BASE_MS),
        format!("{},100,,200,TG 1-1,true", BASE_MS),
    ]);

    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(log.path())
        .unwrap();

    assert_eq!(report.status, DataStatus::Insufficient);
    assert!(report.summaries.is_empty());
    assert_eq!(report.overall, Rag::Green);
    assert!(report.series.labels.is_empty());
    assert!(report.series.throughput.is_empty());
    assert!(report.series.transactions.is_empty());
    assert!(!report.steady_state.is_steady);
    assert_eq!(report.test_period, "N/A");
}

#[test]
fn test_scenario_d_two_minute_buckets() {
    let lines: Vec<String> = (0..120)
        .map(|i| row(i * 1000, 200, "Search", "TG 1-1", true))
        .collect();
    let log = write_log(&lines);

    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(log.path())
        .unwrap();

    assert_eq!(report.series.labels, vec!["22:14", "22:15"]);
    assert_eq!(
        report.series.values("Search", SeriesMetric::SampleCount),
        Some(&[Some(60.0), Some(60.0)][..])
    );
    let means = report.series.values("Search", SeriesMetric::Mean).unwrap();
    assert!(means.iter().all(Option::is_some));
    assert_eq!(report.series.throughput, vec![60, 60]);
    assert_eq!(report.test_period, "22:14–22:15");
    assert_eq!(report.display_total_duration(), "119s");
}

#[test]
fn test_second_granularity_buckets() {
    let lines: Vec<String> = (0..10)
        .map(|i| row(i * 500, 100, "Search", "TG 1-1", true))
        .collect();
    let log = write_log(&lines);

    let mut config = AnalysisConfig::default();
    config.series.bucket_width_secs = 1;
    let report = Analyzer::new(config).analyze_path(log.path()).unwrap();

    assert_eq!(report.series.len(), 5);
    assert_eq!(report.series.labels[0], "22:14:00");
    assert_eq!(report.series.throughput, vec![2, 2, 2, 2, 2]);
}

#[test]
fn test_window_restricts_summaries_and_series() {
    let lines: Vec<String> = (0..180)
        .map(|i| row(i * 1000, 100, "Search", "TG 1-1", true))
        .collect();
    let log = write_log(&lines);

    let mut config = AnalysisConfig::default();
    config.window.start = Some((BASE_MS + 60_000).to_string());
    config.window.end = Some((BASE_MS + 119_999).to_string());
    let report = Analyzer::new(config).analyze_path(log.path()).unwrap();

    assert_eq!(report.summaries[0].sample_count, 60);
    assert_eq!(report.series.labels, vec!["22:15"]);
    assert_eq!(
        report.test_window_ms,
        Some((BASE_MS + 60_000, BASE_MS + 119_000))
    );
}

#[test]
fn test_concurrency_from_thread_names() {
    let log = write_log(&[
        row(0, 100, "Login", "TG 1-1", true),
        row(1_000, 100, "Login", "TG 1-2", true),
        row(2_000, 100, "Search", "TG 1-3", true),
        row(61_000, 100, "Search", "TG 1-1", true),
    ]);

    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(log.path())
        .unwrap();

    assert_eq!(report.series.concurrency, Some(vec![3, 1]));
    assert_eq!(report.peak_concurrent_users, Some(3));
}

#[test]
fn test_log_without_thread_column_omits_concurrency() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "timeStamp,elapsed,label,success").unwrap();
    writeln!(file, "{BASE_MS},100,Login,true").unwrap();
    file.flush().unwrap();

    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(file.path())
        .unwrap();

    assert_eq!(report.series.concurrency, None);
    assert_eq!(report.peak_concurrent_users, None);
}

#[test]
fn test_empty_file_is_malformed() {
    let file = NamedTempFile::new().unwrap();

    let err = Analyzer::new(AnalysisConfig::default())
        .analyze_path(file.path())
        .unwrap_err();

    assert!(err.is_malformed_input());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Analyzer::new(AnalysisConfig::default())
        .analyze_path(dir.path().join("missing.jtl"))
        .unwrap_err();

    assert!(matches!(err, PulseError::Io(_)));
}

#[test]
fn test_report_serializes_to_json() {
    let log = scenario_a_log();
    let report = Analyzer::new(AnalysisConfig::default())
        .analyze_path(log.path())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["overall"], "GREEN");
    assert_eq!(json["policy"], "avg");
    assert_eq!(json["summaries"][0]["name"], "Login");
}
