//! Deaggregation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kinagg_bench::{aggregated_batch, generate_records, random_data};
use kinagg_core::{Deaggregator, DeaggregatorConfig, PhysicalRecord};

/// Benchmark expanding aggregates by user record count.
fn bench_deaggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("deaggregate");

    for count in [10, 100, 1000].iter() {
        let physical = aggregated_batch(generate_records(*count, 16, 128));
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &physical, |b, physical| {
            let deaggregator = Deaggregator::new();
            b.iter(|| black_box(deaggregator.deaggregate(physical).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark the cost of digest verification.
fn bench_checksum(c: &mut Criterion) {
    let physical = aggregated_batch(generate_records(1000, 16, 512));
    let mut group = c.benchmark_group("checksum");

    for verify in [true, false] {
        let deaggregator =
            Deaggregator::with_config(DeaggregatorConfig::default().verify_checksums(verify));
        group.bench_function(if verify { "verified" } else { "unverified" }, |b| {
            b.iter(|| black_box(deaggregator.deaggregate(&physical).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark plain records passing through.
fn bench_passthrough(c: &mut Criterion) {
    let plain: Vec<PhysicalRecord> = (0..1000)
        .map(|i| PhysicalRecord::new(format!("pk-{i}"), random_data(128)))
        .collect();

    c.bench_function("passthrough_1000", |b| {
        let deaggregator = Deaggregator::new();
        b.iter(|| black_box(deaggregator.deaggregate(&plain).unwrap()));
    });
}

criterion_group!(benches, bench_deaggregate, bench_checksum, bench_passthrough);
criterion_main!(benches);
