//! Ordered secondary indexes and their scan compilers.
//!
//! Indexes are access paths owned by a [`crate::Table`]. Queries never name
//! an index; the [`crate::IndexPlanner`] picks indexes by asking each one
//! whether it [can match](QueryableIndex::can_match) a predicate node.
//!
//! - [`bounds`](leaf_bounds): filter to key interval translation
//! - [`scan_prefix`] / [`scan_range`]: cursor walks that collect row ids
//! - [`OrderedIndex`]: single and composite field indexes

mod bounds;
mod ordered;
mod scan;
mod traits;

pub use bounds::{leaf_bounds, ScanBounds};
pub use ordered::{IndexField, OrderedIndex};
pub use scan::{row_id_from_key, scan_prefix, scan_range, ROW_ID_LEN};
pub use traits::{IndexScan, IndexSpec, QueryableIndex};
