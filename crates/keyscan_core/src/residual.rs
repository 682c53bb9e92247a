//! Residual row matching.
//!
//! Evaluates a predicate tree directly against a decoded row. Used for every
//! condition an index scan could not prove.

use crate::filter::{Filter, FilterTreeNode, ScanMarks};
use crate::record::RowSource;

/// Evaluates `node` against `row`.
///
/// An empty AND holds and an empty OR does not. Branches short-circuit.
pub fn match_tree<R: RowSource + ?Sized>(node: &FilterTreeNode, row: &R) -> bool {
    match node {
        FilterTreeNode::Leaf { filter, .. } => match_filter(filter, row),
        FilterTreeNode::Branch {
            or_kind: true,
            children,
            ..
        } => children.iter().any(|child| match_tree(child, row)),
        FilterTreeNode::Branch { children, .. } => {
            children.iter().all(|child| match_tree(child, row))
        }
    }
}

/// Evaluates one filter against `row`.
///
/// A row without the filtered field never matches.
pub fn match_filter<R: RowSource + ?Sized>(filter: &Filter, row: &R) -> bool {
    match row.value(filter.field_id) {
        Some(value) => filter.matches(value),
        None => false,
    }
}

/// Evaluates `root` against `row`, skipping what index scans proved.
///
/// Only direct children of an AND root (or the root itself) are skipped,
/// since only those proofs hold for every candidate row. Everything else is
/// evaluated in full.
pub fn match_residual<R: RowSource + ?Sized>(
    root: &FilterTreeNode,
    row: &R,
    proven: &ScanMarks,
) -> bool {
    if proven.is_marked(root.id()) {
        return true;
    }
    if root.is_and() {
        return root
            .children()
            .iter()
            .filter(|child| !proven.is_marked(child.id()))
            .all(|child| match_tree(child, row));
    }
    match_tree(root, row)
}
