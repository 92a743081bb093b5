use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vpulse_analysis::{CsvLog, RecordSource};
use vpulse_benchmarks::{format_dataset_size, generate_records, render_jtl};

const DATASET_SIZES: [usize; 2] = [10_000, 100_000];

fn csv_load_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_load");
    group.sample_size(20);

    for &size in DATASET_SIZES.iter() {
        let log = render_jtl(&generate_records(size, 1_800));
        group.throughput(Throughput::Bytes(log.len() as u64));
        group.bench_function(BenchmarkId::from_parameter(format_dataset_size(size)), |b| {
            b.iter(|| {
                let loaded = CsvLog::from_reader(Cursor::new(log.as_bytes()))
                    .load()
                    .unwrap_or_default();
                black_box(loaded.records.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, csv_load_benchmarks);
criterion_main!(benches);
