use chrono::DateTime;
use rand::{rngs::StdRng, Rng, SeedableRng};
use vpulse_core::NormalizedRecord;

/// 2023-11-14 22:14:00 UTC, start of every generated run.
pub const RUN_START_MS: i64 = 1_700_000_040_000;

/// Transactions the generated runs exercise.
pub const TRANSACTIONS: [&str; 6] = [
    "Home", "Login", "Search", "Product", "Checkout", "Logout",
];

/// Virtual users behind the generated runs.
pub const THREADS: usize = 50;

/// Generate a reproducible run of `count` records spread over `duration_secs`.
///
/// Latencies are mostly sub-second with a slow tail and roughly one percent
/// of requests fail, which is what a healthy run looks like.
pub fn generate_records(count: usize, duration_secs: u64) -> Vec<NormalizedRecord> {
    let mut rng = StdRng::seed_from_u64((count as u64) ^ 0x7E57_0001);
    let span_ms = (duration_secs * 1000).max(1) as i64;

    (0..count)
        .map(|i| {
            let offset = (i as i64 * span_ms) / count.max(1) as i64;
            let base: f64 = rng.gen_range(50.0..900.0);
            let elapsed = if rng.gen_bool(0.05) { base * 8.0 } else { base };
            let timestamp = DateTime::from_timestamp_millis(RUN_START_MS + offset)
                .unwrap_or_default();

            NormalizedRecord::new(
                timestamp,
                Some(elapsed),
                TRANSACTIONS[rng.gen_range(0..TRANSACTIONS.len())],
            )
            .with_outcome(!rng.gen_bool(0.01))
            .with_thread(format!("Thread Group 1-{}", rng.gen_range(1..=THREADS)))
        })
        .collect()
}

/// Render records as a JMeter-style CSV log.
pub fn render_jtl(records: &[NormalizedRecord]) -> String {
    let mut out = String::from("timeStamp,elapsed,label,responseCode,threadName,success\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            record.timestamp_millis(),
            record.elapsed_ms.unwrap_or_default().round() as u64,
            record.transaction,
            if record.succeeded { 200 } else { 500 },
            record.thread_name.as_deref().unwrap_or_default(),
            record.succeeded,
        ));
    }
    out
}

pub fn format_dataset_size(size: usize) -> String {
    match size {
        1_000 => "1k".to_string(),
        10_000 => "10k".to_string(),
        100_000 => "100k".to_string(),
        1_000_000 => "1m".to_string(),
        other => other.to_string(),
    }
}
