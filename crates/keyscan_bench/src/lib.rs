//! Benchmark utilities.
//!
//! Builds populated tables over an in-memory store so benchmarks measure
//! planning and scanning rather than setup.

#![warn(missing_docs)]

use keyscan_codec::{FieldType, Value};
use keyscan_core::{IndexSpec, Record, Schema, Table};
use keyscan_storage::InMemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A populated benchmark table.
pub struct BenchTable {
    /// The backing store.
    pub store: InMemoryStore,
    /// The table.
    pub table: Table,
}

/// Schema used by every benchmark: `id`, `group` (0..100), `value`
/// (random `i64`) and `tag` (short text).
pub fn bench_schema() -> Schema {
    Schema::builder("bench")
        .primary_key("id")
        .field("group", FieldType::UInt16)
        .field("value", FieldType::Int64)
        .field("tag", FieldType::Text)
        .build()
        .unwrap()
}

/// Generates `count` random rows with a fixed seed.
pub fn generate_rows(schema: &Schema, count: u64, seed: u64) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    (1..=count)
        .map(|id| {
            Record::from_named(
                schema,
                [
                    ("id", Value::UInt(id)),
                    ("group", Value::UInt(rng.gen_range(0..100))),
                    ("value", Value::Int(rng.gen_range(-1_000_000..1_000_000))),
                    ("tag", Value::Text(format!("t{}", rng.gen_range(0..1000)))),
                ],
            )
            .unwrap()
        })
        .collect()
}

/// Creates a table with `count` rows and the given indexes.
pub fn populated_table(count: u64, indexes: &[IndexSpec]) -> BenchTable {
    let store = InMemoryStore::new();
    let schema = bench_schema();
    let rows = generate_rows(&schema, count, 42);
    let table = Table::create(&store, schema).unwrap();
    table.insert_many(&store, rows).unwrap();
    for spec in indexes {
        table.add_index(&store, spec.clone()).unwrap();
    }
    BenchTable { store, table }
}

/// Random encodable values for codec benchmarks.
pub fn random_values(count: usize) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count).map(|_| Value::Int(rng.gen())).collect()
}
