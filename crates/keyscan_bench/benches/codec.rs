//! Ordered key encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use keyscan_bench::random_values;
use keyscan_codec::{decode_value, encode_value, EncodingConfig, FieldType};

fn bench_encode(c: &mut Criterion) {
    let values = random_values(1024);
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(values.len() as u64));

    for (name, cfg) in [
        ("ordered", EncodingConfig::ordered()),
        ("compact", EncodingConfig::compact()),
    ] {
        group.bench_function(name, |b| {
            let mut buf = Vec::with_capacity(values.len() * 8);
            b.iter(|| {
                buf.clear();
                for value in &values {
                    encode_value(&mut buf, FieldType::Int64, black_box(value), &cfg).unwrap();
                }
                black_box(buf.len())
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let cfg = EncodingConfig::ordered();
    let mut buf = Vec::new();
    for value in &random_values(1024) {
        encode_value(&mut buf, FieldType::Int64, value, &cfg).unwrap();
    }

    c.bench_function("decode_ordered", |b| {
        b.iter(|| {
            let mut pos = 0;
            while pos < buf.len() {
                let (value, used) = decode_value(&buf[pos..], FieldType::Int64, &cfg).unwrap();
                black_box(value);
                pos += used;
            }
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
