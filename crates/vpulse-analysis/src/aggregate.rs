//! Per-transaction aggregation.

use std::collections::BTreeMap;
use vpulse_core::{NormalizedRecord, TransactionSummary};

use crate::stats::LatencyStats;

/// Groups records by transaction and summarizes each group.
///
/// Summaries come back ordered by transaction name, without verdicts.
pub fn aggregate<'a, I>(records: I) -> Vec<TransactionSummary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&NormalizedRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.transaction.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(name, group)| {
            let stats = LatencyStats::from_records(group.iter().copied());
            debug_assert!(stats.sample_count > 0, "empty partition for `{name}`");

            TransactionSummary {
                name: name.to_string(),
                sample_count: stats.sample_count,
                mean_seconds: stats.mean_seconds,
                p90_seconds: stats.p90_seconds,
                p95_seconds: stats.p95_seconds,
                error_rate_percent: stats.error_rate_percent.unwrap_or_default(),
                verdict: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn record(name: &str, elapsed_ms: f64, ok: bool) -> NormalizedRecord {
        NormalizedRecord::new(DateTime::from_timestamp_millis(0).unwrap(), Some(elapsed_ms), name)
            .with_outcome(ok)
    }

    #[test]
    fn test_groups_by_transaction_in_name_order() {
        let records = vec![
            record("Search", 500.0, true),
            record("Login", 1000.0, true),
            record("Search", 1500.0, false),
            record("Login", 3000.0, false),
            record("Search", 1000.0, true),
        ];

        let summaries = aggregate(&records);
        assert_eq!(summaries.len(), 2);

        let login = &summaries[0];
        assert_eq!(login.name, "Login");
        assert_eq!(login.sample_count, 2);
        assert_eq!(login.mean_seconds, Some(2.0));
        assert_eq!(login.error_rate_percent, 50.0);
        assert!(login.verdict.is_none());

        let search = &summaries[1];
        assert_eq!(search.name, "Search");
        assert_eq!(search.sample_count, 3);
        assert_eq!(search.mean_seconds, Some(1.0));
        assert!((search.error_rate_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentiles_are_ordered() {
        let records: Vec<_> = (1..=50)
            .map(|i| record("T", f64::from(i * 37 % 101), true))
            .collect();
        let summary = &aggregate(&records)[0];

        assert!(summary.p90_seconds.unwrap() <= summary.p95_seconds.unwrap());
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(std::iter::empty()).is_empty());
    }
}
