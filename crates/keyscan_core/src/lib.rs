//! # keyscan core
//!
//! Condition-to-range-scan compiler and index matching engine.
//!
//! For each query this crate decides which predicates a sorted index can
//! serve, turns them into exact byte-range scans over the index's key order,
//! and re-checks whatever the scans could not prove, so partial index
//! coverage never changes a query's result.
//!
//! This crate provides:
//! - The predicate model ([`Condition`], [`FilterTree`], [`FilterTreeNode`])
//! - Byte-range utilities ([`prefix_limit`], [`KeyRange`])
//! - Ordered single and composite indexes ([`OrderedIndex`])
//! - Primary key narrowing ([`pk_range`])
//! - The residual row matcher ([`match_tree`], [`match_residual`])
//! - The plan combiner ([`IndexPlanner`]) and query execution ([`Table`])
//!
//! ## Example
//!
//! ```
//! use keyscan_codec::{FieldType, Value};
//! use keyscan_core::{
//!     Condition, IndexSpec, QueryContext, QueryOptions, Record, Schema, Table,
//! };
//! use keyscan_storage::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! let schema = Schema::builder("points")
//!     .primary_key("id")
//!     .field("x", FieldType::Int32)
//!     .build()
//!     .unwrap();
//! let table = Table::create(&store, schema).unwrap();
//! table.add_index(&store, IndexSpec::new("by_x").field("x")).unwrap();
//!
//! for id in 1..=10u64 {
//!     let row = Record::from_named(
//!         table.schema(),
//!         [("id", Value::UInt(id)), ("x", Value::Int(id as i64))],
//!     )
//!     .unwrap();
//!     table.insert(&store, row).unwrap();
//! }
//!
//! let tree = Condition::ge("x", 5).compile(table.schema()).unwrap();
//! let ctx = QueryContext::new(&store);
//! let rows = table.query(&ctx, &tree, QueryOptions::new()).unwrap();
//! assert_eq!(rows.len(), 6);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bitmap;
mod config;
mod context;
mod error;
pub mod filter;
pub mod index;
mod keyrange;
mod pk;
mod plan;
mod record;
mod residual;
mod schema;
mod stats;
mod table;
mod types;

pub use bitmap::RowBitmap;
pub use config::{QueryConfig, QueryOptions};
pub use context::{CancelToken, QueryContext};
pub use error::{CoreError, CoreResult};
pub use filter::{
    Condition, Filter, FilterMode, FilterTree, FilterTreeNode, FilterValue, Matcher, ScanMarks,
};
pub use index::{
    leaf_bounds, row_id_from_key, scan_prefix, scan_range, IndexField, IndexScan, IndexSpec,
    OrderedIndex, QueryableIndex, ScanBounds, ROW_ID_LEN,
};
pub use keyrange::{ff_sentinel, prefix_limit, KeyRange, FF, ZERO};
pub use pk::{pk_range, PkRange};
pub use plan::{CoveragePlan, IndexPlanner};
pub use record::{Record, RowSource};
pub use residual::{match_filter, match_residual, match_tree};
pub use schema::{Field, Schema, SchemaBuilder};
pub use stats::{ExecutionStrategy, IndexStats, IndexStatsSnapshot, PlanStats};
pub use table::Table;
pub use types::{FieldId, NodeId, RowId, MAX_PK, MIN_PK, NO_PK};
