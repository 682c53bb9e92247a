//! Test fixtures and table helpers.
//!
//! [`TestTable`] bundles an in-memory store with one table, and offers a
//! linear reference evaluator so index-backed results can be checked
//! against a plain walk over every row.

use keyscan_codec::{FieldType, Value};
use keyscan_core::{
    match_tree, Condition, CoreResult, FilterTree, IndexSpec, PlanStats, QueryConfig,
    QueryContext, QueryOptions, Record, RowId, Schema, Table,
};
use keyscan_storage::InMemoryStore;

/// Name of the synthetic table.
pub const SYNTHETIC: &str = "synthetic";

/// A table over its own in-memory store.
pub struct TestTable {
    /// The backing store.
    pub store: InMemoryStore,
    /// The table.
    pub table: Table,
}

impl TestTable {
    /// Creates an empty table.
    pub fn new(schema: Schema) -> Self {
        let store = InMemoryStore::new();
        let table = Table::create(&store, schema).expect("Failed to create table");
        Self { store, table }
    }

    /// Creates the synthetic table with the given indexes and rows.
    pub fn synthetic(indexes: &[IndexSpec], rows: &[SyntheticRow]) -> Self {
        let fixture = Self::new(synthetic_schema());
        for spec in indexes {
            fixture
                .table
                .add_index(&fixture.store, spec.clone())
                .expect("Failed to add index");
        }
        fixture.insert(rows.iter().map(|row| row.to_record(fixture.table.schema())));
        fixture
    }

    /// Inserts rows, panicking on failure.
    pub fn insert(&self, rows: impl IntoIterator<Item = Record>) {
        self.table
            .insert_many(&self.store, rows)
            .expect("Failed to insert rows");
    }

    /// Creates a query context with default configuration.
    pub fn ctx(&self) -> QueryContext<'_> {
        QueryContext::new(&self.store)
    }

    /// Creates a query context with the given configuration.
    pub fn ctx_with(&self, config: QueryConfig) -> QueryContext<'_> {
        QueryContext::new(&self.store).with_config(config)
    }

    /// Compiles a condition against the table schema.
    pub fn compile(&self, cond: &Condition) -> FilterTree {
        cond.compile(self.table.schema())
            .expect("Failed to compile condition")
    }

    /// Runs a condition and returns the matching row ids with the plan
    /// statistics.
    pub fn run(&self, cond: &Condition) -> CoreResult<(Vec<RowId>, PlanStats)> {
        let tree = self.compile(cond);
        let ctx = self.ctx();
        let (rows, stats) = self.table.query_with_stats(&ctx, &tree, QueryOptions::new())?;
        Ok((self.row_ids(&rows), stats))
    }

    /// Runs a condition and returns the matching row ids.
    pub fn query_ids(&self, cond: &Condition) -> Vec<RowId> {
        self.run(cond).expect("Query failed").0
    }

    /// Evaluates a condition by walking every row without indexes.
    pub fn linear_ids(&self, cond: &Condition) -> Vec<RowId> {
        let tree = self.compile(cond);
        self.all_rows()
            .into_iter()
            .filter(|row| match_tree(tree.root(), row))
            .filter_map(|row| row.row_id(self.table.schema()))
            .collect()
    }

    /// Returns every row in primary key order.
    pub fn all_rows(&self) -> Vec<Record> {
        let ctx = self.ctx();
        self.table
            .query(&ctx, &FilterTree::match_all(), QueryOptions::new())
            .expect("Failed to read rows")
    }

    fn row_ids(&self, rows: &[Record]) -> Vec<RowId> {
        rows.iter()
            .filter_map(|row| row.row_id(self.table.schema()))
            .collect()
    }
}

impl std::ops::Deref for TestTable {
    type Target = Table;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

/// Schema of the synthetic table.
///
/// | field | type    |
/// |-------|---------|
/// | id    | UInt64  |
/// | a     | Int32   |
/// | b     | Int64   |
/// | c     | Text    |
/// | d     | Float64 |
/// | e     | UInt8   |
pub fn synthetic_schema() -> Schema {
    Schema::builder(SYNTHETIC)
        .primary_key("id")
        .field("a", FieldType::Int32)
        .field("b", FieldType::Int64)
        .field("c", FieldType::Text)
        .field("d", FieldType::Float64)
        .field("e", FieldType::UInt8)
        .build()
        .expect("Synthetic schema is valid")
}

/// One row of the synthetic table.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRow {
    /// Primary key.
    pub id: u64,
    /// Small signed value.
    pub a: i32,
    /// Wide signed value.
    pub b: i64,
    /// Short text.
    pub c: String,
    /// Float value.
    pub d: f64,
    /// Byte value.
    pub e: u8,
}

impl SyntheticRow {
    /// Converts the row into a record of the synthetic schema.
    pub fn to_record(&self, schema: &Schema) -> Record {
        Record::from_named(
            schema,
            [
                ("id", Value::UInt(self.id)),
                ("a", Value::Int(i64::from(self.a))),
                ("b", Value::Int(self.b)),
                ("c", Value::Text(self.c.clone())),
                ("d", Value::Float(self.d)),
                ("e", Value::UInt(u64::from(self.e))),
            ],
        )
        .expect("Synthetic row matches its schema")
    }
}

/// Deterministic synthetic rows with ids `1..=count`.
///
/// Values cycle with small periods so every equality matches several rows
/// and negative numbers appear.
pub fn synthetic_rows(count: u64) -> Vec<SyntheticRow> {
    const WORDS: [&str; 5] = ["", "ant", "an", "bee", "b\0x"];
    (1..=count)
        .map(|id| {
            let i = id as i64;
            SyntheticRow {
                id,
                a: ((i * 7) % 11 - 5) as i32,
                b: (i % 4) * 1_000_000_007 - 2_000_000_000,
                c: WORDS[(id % WORDS.len() as u64) as usize].to_string(),
                d: (i % 9) as f64 * 0.5 - 2.0,
                e: (id % 3) as u8 * 127,
            }
        })
        .collect()
}

/// Builds a [`QueryConfig`] from a JSON object.
pub fn config_from_json(json: &str) -> QueryConfig {
    serde_json::from_str(json).expect("Invalid query config JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_fixture_loads() {
        let fixture = TestTable::synthetic(&[IndexSpec::new("a").field("a")], &synthetic_rows(20));
        assert_eq!(fixture.all_rows().len(), 20);
        assert_eq!(fixture.index_names(), vec!["a".to_string()]);
    }

    #[test]
    fn linear_matches_query_without_indexes() {
        let fixture = TestTable::synthetic(&[], &synthetic_rows(30));
        let cond = Condition::and(vec![Condition::ge("a", 0), Condition::equal("c", "ant")]);
        assert_eq!(fixture.query_ids(&cond), fixture.linear_ids(&cond));
    }

    #[test]
    fn config_json_defaults() {
        let config = config_from_json(r#"{"use_indexes": false}"#);
        assert!(!config.use_indexes);
        assert_eq!(config.cancel_check_interval, 1024);
    }
}
