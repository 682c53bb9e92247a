//! Index traits and specifications.

use crate::bitmap::RowBitmap;
use crate::context::QueryContext;
use crate::error::CoreResult;
use crate::filter::{FilterTreeNode, ScanMarks};
use crate::types::FieldId;

/// The result of one index scan.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexScan {
    /// Row ids returned by the scan.
    pub bits: RowBitmap,
    /// True if `bits` may contain rows that do not satisfy the scanned
    /// conditions.
    ///
    /// Ordered range and prefix scans are exact and always report `false`.
    /// Lossy index kinds must set it, and must not mark what they scanned.
    pub can_collide: bool,
}

impl IndexScan {
    /// An exact scan result.
    pub fn exact(bits: RowBitmap) -> Self {
        Self {
            bits,
            can_collide: false,
        }
    }
}

/// An index the planner can compile conditions against.
///
/// Compilers return `Ok(None)` when the index is not applicable to the node;
/// this is distinct from `Ok(Some(scan))` with an empty bitmap.
pub trait QueryableIndex {
    /// Index name.
    fn name(&self) -> &str;

    /// Indexed field ids in key order.
    fn field_ids(&self) -> Vec<FieldId>;

    /// Returns true if the index can serve `node` with a range scan.
    ///
    /// Pure and repeatable; never reads or writes scan marks.
    fn can_match(&self, node: &FilterTreeNode) -> bool;

    /// Compiles a single leaf into a scan and runs it.
    ///
    /// Marks the leaf in `marks` after a successful scan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidCondition`] for branch nodes, and
    /// propagates encoding, storage and cancellation errors.
    fn query(
        &self,
        ctx: &QueryContext<'_>,
        node: &FilterTreeNode,
        marks: &mut ScanMarks,
    ) -> CoreResult<Option<IndexScan>>;

    /// Compiles the direct leaf children of an AND node into one scan over
    /// the index's field order, and runs it.
    ///
    /// Marks every leaf the scan proved after a successful scan.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidCondition`] for leaves and OR
    /// nodes, and propagates encoding, storage and cancellation errors.
    fn query_composite(
        &self,
        ctx: &QueryContext<'_>,
        node: &FilterTreeNode,
        marks: &mut ScanMarks,
    ) -> CoreResult<Option<IndexScan>>;
}

/// Specification for an ordered index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Index name, unique within a table.
    pub name: String,
    /// Indexed field names in key order.
    pub fields: Vec<String>,
}

impl IndexSpec {
    /// Creates a specification without fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field to the key.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_spec_builder() {
        let spec = IndexSpec::new("by_ab").field("a").field("b");
        assert_eq!(spec.name, "by_ab");
        assert_eq!(spec.fields, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn exact_scan() {
        let scan = IndexScan::exact(RowBitmap::new());
        assert!(!scan.can_collide);
        assert!(scan.bits.is_empty());
    }
}
