//! Index coverage planning.
//!
//! The planner walks a compiled predicate tree and asks the table's indexes
//! to serve as much of it as they can:
//!
//! - a leaf is served by the first index that can match it;
//! - an AND first tries one composite scan per index, then serves each
//!   remaining leaf on its own and recurses into OR children, intersecting
//!   every result;
//! - an OR is served only if every child is, by the union of their results.
//!
//! Every node an index scan fully proved is recorded in [`ScanMarks`]; a
//! branch is marked once all of its children are. A marked root means the
//! candidate bitmap is exactly the result set.

use tracing::{debug, trace};

use crate::bitmap::RowBitmap;
use crate::context::QueryContext;
use crate::error::CoreResult;
use crate::filter::{FilterTreeNode, ScanMarks};
use crate::index::{IndexScan, QueryableIndex};

/// The outcome of planning one predicate tree.
#[derive(Debug, Clone, Default)]
pub struct CoveragePlan {
    /// Candidate row ids, or `None` if indexes could not bound the result.
    pub bits: Option<RowBitmap>,
    /// True if `bits` is exactly the result set.
    pub exact: bool,
    /// Nodes proven by index scans.
    pub proven: ScanMarks,
    /// Number of index scans that ran.
    pub index_scans: u64,
}

impl CoveragePlan {
    fn uncovered() -> Self {
        Self::default()
    }
}

/// Chooses index scans for a predicate tree.
pub struct IndexPlanner<'a> {
    indexes: Vec<&'a dyn QueryableIndex>,
}

impl<'a> IndexPlanner<'a> {
    /// Creates a planner over the given indexes, tried in order.
    pub fn new(indexes: impl IntoIterator<Item = &'a dyn QueryableIndex>) -> Self {
        Self {
            indexes: indexes.into_iter().collect(),
        }
    }

    /// Returns the number of candidate indexes.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if there are no candidate indexes.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Plans `root`, running the chosen index scans.
    ///
    /// # Errors
    ///
    /// Propagates scan errors and cancellation.
    pub fn plan(&self, ctx: &QueryContext<'_>, root: &FilterTreeNode) -> CoreResult<CoveragePlan> {
        if !ctx.config().use_indexes || self.indexes.is_empty() || root.is_match_all() {
            return Ok(CoveragePlan::uncovered());
        }

        let mut walk = Walk {
            ctx,
            proven: ScanMarks::new(),
            scans: 0,
        };
        let bits = self.cover(&mut walk, root)?;
        let exact = bits.is_some() && walk.proven.is_marked(root.id());
        debug!(
            covered = bits.is_some(),
            exact,
            scans = walk.scans,
            proven = walk.proven.len(),
            "index plan"
        );
        Ok(CoveragePlan {
            bits,
            exact,
            proven: walk.proven,
            index_scans: walk.scans,
        })
    }

    fn cover(&self, walk: &mut Walk<'_, '_>, node: &FilterTreeNode) -> CoreResult<Option<RowBitmap>> {
        walk.ctx.check_cancelled()?;
        match node {
            FilterTreeNode::Leaf { .. } => self.cover_leaf(walk, node),
            FilterTreeNode::Branch {
                or_kind: true,
                children,
                ..
            } => {
                let mut acc = RowBitmap::new();
                for child in children {
                    match self.cover(walk, child)? {
                        Some(bits) => acc.or(&bits),
                        None => {
                            trace!(node = %node.id(), child = %child.id(), "OR child not covered");
                            return Ok(None);
                        }
                    }
                }
                if children.iter().all(|c| walk.proven.is_marked(c.id())) {
                    walk.proven.mark(node.id());
                }
                Ok(Some(acc))
            }
            FilterTreeNode::Branch { children, .. } => {
                let mut acc: Option<RowBitmap> = None;
                let mut intersect = |bits: RowBitmap| match acc.as_mut() {
                    Some(acc) => acc.and(&bits),
                    None => acc = Some(bits),
                };

                for index in &self.indexes {
                    let useful = index.can_match(node)
                        && children
                            .iter()
                            .any(|c| !walk.proven.is_marked(c.id()) && index.can_match(c));
                    if !useful {
                        continue;
                    }
                    if let Some(scan) = index.query_composite(walk.ctx, node, &mut walk.proven)? {
                        walk.scans += 1;
                        trace!(index = index.name(), rows = scan.bits.count(), "composite scan used");
                        intersect(scan.bits);
                    }
                }

                for child in children {
                    if walk.proven.is_marked(child.id()) {
                        continue;
                    }
                    if let Some(bits) = self.cover(walk, child)? {
                        intersect(bits);
                    }
                }

                if acc.is_some() && children.iter().all(|c| walk.proven.is_marked(c.id())) {
                    walk.proven.mark(node.id());
                }
                Ok(acc)
            }
        }
    }

    fn cover_leaf(&self, walk: &mut Walk<'_, '_>, leaf: &FilterTreeNode) -> CoreResult<Option<RowBitmap>> {
        for index in &self.indexes {
            if !index.can_match(leaf) {
                continue;
            }
            if let Some(IndexScan { bits, .. }) = index.query(walk.ctx, leaf, &mut walk.proven)? {
                walk.scans += 1;
                trace!(index = index.name(), leaf = %leaf.id(), rows = bits.count(), "leaf scan used");
                return Ok(Some(bits));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for IndexPlanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.indexes.iter().map(|i| i.name()).collect();
        f.debug_struct("IndexPlanner").field("indexes", &names).finish()
    }
}

/// State threaded through one planning walk.
struct Walk<'c, 's> {
    ctx: &'c QueryContext<'s>,
    proven: ScanMarks,
    scans: u64,
}
