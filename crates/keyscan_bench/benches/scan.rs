//! Index scan versus full scan benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyscan_bench::populated_table;
use keyscan_core::{Condition, IndexSpec, QueryConfig, QueryContext, QueryOptions};

const SIZES: [u64; 3] = [1_000, 10_000, 50_000];

/// Benchmark a selective range on an indexed field against the same query
/// with indexes disabled.
fn bench_range_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_query");

    for size in SIZES {
        let bench = populated_table(size, &[IndexSpec::new("value").field("value")]);
        let tree = Condition::range("value", -10_000, 10_000)
            .compile(bench.table.schema())
            .unwrap();
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("index", size), &size, |b, _| {
            b.iter(|| {
                let ctx = QueryContext::new(&bench.store);
                black_box(bench.table.count(&ctx, black_box(&tree)).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("full_scan", size), &size, |b, _| {
            b.iter(|| {
                let ctx = QueryContext::new(&bench.store)
                    .with_config(QueryConfig::new().use_indexes(false));
                black_box(bench.table.count(&ctx, black_box(&tree)).unwrap())
            });
        });
    }
    group.finish();
}

/// Benchmark a composite equality-plus-range scan.
fn bench_composite_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_query");

    for size in SIZES {
        let bench = populated_table(
            size,
            &[IndexSpec::new("group_value").field("group").field("value")],
        );
        let tree = Condition::and(vec![
            Condition::equal("group", 7u64),
            Condition::ge("value", 0),
        ])
        .compile(bench.table.schema())
        .unwrap();
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let ctx = QueryContext::new(&bench.store);
                black_box(bench.table.count(&ctx, black_box(&tree)).unwrap())
            });
        });
    }
    group.finish();
}

/// Benchmark an index plan that leaves a residual condition.
fn bench_residual_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("residual_query");

    for size in SIZES {
        let bench = populated_table(size, &[IndexSpec::new("group").field("group")]);
        let tree = Condition::and(vec![
            Condition::lt("group", 10u64),
            Condition::regexp("tag", "^t1"),
        ])
        .compile(bench.table.schema())
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let ctx = QueryContext::new(&bench.store);
                let rows = bench
                    .table
                    .query(&ctx, black_box(&tree), QueryOptions::new().limit(100))
                    .unwrap();
                black_box(rows)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_range_query,
    bench_composite_query,
    bench_residual_query,
);

criterion_main!(benches);
