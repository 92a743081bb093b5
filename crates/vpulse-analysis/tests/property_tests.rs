// Property-based tests for the analysis pipeline
//
// Properties tested:
// 1. Error rate stays within 0-100 and every summary has samples
// 2. p90 never exceeds p95
// 3. Series sample counts add up to the summary sample count
// 4. Overall verdict is the most severe individual verdict
// 5. Verdicts are monotonic in the basis metric
// 6. Inverted window bounds leave the record set unchanged

use chrono::DateTime;
use proptest::prelude::*;
use vpulse_analysis::{
    aggregate, filter_window, overall_verdict, Classifier, SeriesBuilder, TimeWindow,
};
use vpulse_core::{
    ClassificationPolicy, NormalizedRecord, Rag, SeriesMetric, ThresholdConfig,
    TransactionSummary,
};

const BASE_MS: i64 = 1_700_000_040_000;
const TRANSACTIONS: [&str; 4] = ["Checkout", "Login", "Search", "Logout"];

fn record_strategy() -> impl Strategy<Value = NormalizedRecord> {
    (0i64..600_000, 0.0f64..10_000.0, any::<bool>(), 0usize..TRANSACTIONS.len()).prop_map(
        |(offset_ms, elapsed_ms, succeeded, txn)| {
            NormalizedRecord::new(
                DateTime::from_timestamp_millis(BASE_MS + offset_ms).unwrap(),
                Some(elapsed_ms),
                TRANSACTIONS[txn],
            )
            .with_outcome(succeeded)
        },
    )
}

fn records_strategy() -> impl Strategy<Value = Vec<NormalizedRecord>> {
    prop::collection::vec(record_strategy(), 1..200)
}

fn summary_with(basis_seconds: f64) -> TransactionSummary {
    TransactionSummary {
        name: "T".to_string(),
        sample_count: 1,
        mean_seconds: Some(basis_seconds),
        p90_seconds: Some(basis_seconds),
        p95_seconds: Some(basis_seconds),
        error_rate_percent: 0.0,
        verdict: None,
    }
}

// ============================================================================
// Property 1 & 2: Summary bounds and percentile ordering
// ============================================================================

proptest! {
    #[test]
    fn prop_summary_bounds(records in records_strategy()) {
        for summary in aggregate(&records) {
            prop_assert!(summary.sample_count >= 1);
            prop_assert!((0.0..=100.0).contains(&summary.error_rate_percent));

            let p90 = summary.p90_seconds.unwrap();
            let p95 = summary.p95_seconds.unwrap();
            prop_assert!(p90 <= p95 + 1e-12, "p90 {} > p95 {}", p90, p95);
        }
    }
}

// ============================================================================
// Property 3: Series and summaries agree on sample counts
// ============================================================================

proptest! {
    #[test]
    fn prop_series_counts_match_summaries(
        records in records_strategy(),
        bucket_secs in 1u64..=120,
    ) {
        let builder = SeriesBuilder::new(
            std::time::Duration::from_secs(bucket_secs),
            &SeriesMetric::ALL,
        );
        let series = builder.build(&records, false);
        let summaries = aggregate(&records);

        prop_assert_eq!(series.transactions.len(), summaries.len());
        for summary in &summaries {
            let counts = series.values(&summary.name, SeriesMetric::SampleCount).unwrap();
            prop_assert_eq!(counts.len(), series.len());
            let total: f64 = counts.iter().map(|c| c.unwrap()).sum();
            prop_assert_eq!(total as usize, summary.sample_count);
        }

        let throughput: u64 = series.throughput.iter().sum();
        prop_assert_eq!(throughput as usize, records.len());
    }
}

// ============================================================================
// Property 4 & 5: Verdict reduction and monotonicity
// ============================================================================

proptest! {
    #[test]
    fn prop_overall_is_most_severe(records in records_strategy()) {
        let classifier = Classifier::new(ClassificationPolicy::P90, &ThresholdConfig::default());
        let mut summaries = aggregate(&records);
        let overall = classifier.classify_all(&mut summaries);

        let verdicts: Vec<Rag> = summaries.iter().filter_map(|s| s.verdict).collect();
        let expected = if verdicts.contains(&Rag::Red) {
            Rag::Red
        } else if verdicts.contains(&Rag::Amber) {
            Rag::Amber
        } else {
            Rag::Green
        };
        prop_assert_eq!(overall, expected);
        prop_assert_eq!(overall_verdict(&summaries), expected);
    }

    #[test]
    fn prop_verdict_monotonic(
        a in 0.0f64..10.0,
        b in 0.0f64..10.0,
        use_p90 in any::<bool>(),
    ) {
        let policy = if use_p90 { ClassificationPolicy::P90 } else { ClassificationPolicy::Avg };
        let classifier = Classifier::new(policy, &ThresholdConfig::default());
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        prop_assert!(
            classifier.classify(&summary_with(low)) <= classifier.classify(&summary_with(high))
        );
    }
}

// ============================================================================
// Property 6: Inverted windows are ignored
// ============================================================================

proptest! {
    #[test]
    fn prop_inverted_window_is_noop(
        records in records_strategy(),
        start in 1i64..600_000,
        gap in 1i64..600_000,
    ) {
        let start_ms = BASE_MS + start;
        let start = start_ms.to_string();
        let end = (start_ms - gap).to_string();
        let window = TimeWindow::from_bounds(Some(start.as_str()), Some(end.as_str()));

        prop_assert!(window.is_none());
        prop_assert_eq!(filter_window(&records, window).len(), records.len());
    }
}
