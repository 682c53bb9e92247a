//! Compiled predicate trees.

use std::collections::HashSet;
use std::fmt;

use keyscan_codec::{FieldType, Value};

use super::matcher::Matcher;
use super::mode::FilterMode;
use crate::error::CoreResult;
use crate::schema::Field;
use crate::types::{FieldId, NodeId};

/// The operand of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Operand of Equal, NotEqual, Lt, Le, Gt, Ge.
    Scalar(Value),
    /// Inclusive bounds of Range.
    Range(Value, Value),
    /// Operand list of In and NotIn.
    List(Vec<Value>),
    /// Regular expression of Regexp.
    Pattern(String),
}

impl FilterValue {
    /// Returns a short name for the operand shape.
    pub fn shape(&self) -> &'static str {
        match self {
            FilterValue::Scalar(_) => "scalar",
            FilterValue::Range(..) => "range",
            FilterValue::List(_) => "list",
            FilterValue::Pattern(_) => "pattern",
        }
    }

    /// Returns the scalar operand.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FilterValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

/// One condition on one field.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Field name.
    pub name: String,
    /// Field id.
    pub field_id: FieldId,
    /// Declared type of the field.
    pub field_type: FieldType,
    /// Comparison mode.
    pub mode: FilterMode,
    /// Operand, already cast to `field_type`.
    pub value: FilterValue,
    matcher: Matcher,
}

impl Filter {
    /// Creates a filter on `field`, precompiling its matcher.
    ///
    /// `value` must already be cast to the field type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidCondition`] if the operand shape
    /// does not fit the mode.
    pub fn new(field: &Field, mode: FilterMode, value: FilterValue) -> CoreResult<Self> {
        let matcher = Matcher::compile(mode, &value)?;
        Ok(Self {
            name: field.name.clone(),
            field_id: field.id,
            field_type: field.ty,
            mode,
            value,
            matcher,
        })
    }

    /// Returns the precompiled matcher.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Returns true if `value` satisfies the filter.
    pub fn matches(&self, value: &Value) -> bool {
        self.matcher.matches(value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Scalar(v) => write!(f, "{} {} {v}", self.name, self.mode),
            FilterValue::Range(lo, hi) => write!(f, "{} BETWEEN {lo} AND {hi}", self.name),
            FilterValue::List(values) => {
                write!(f, "{} {} (", self.name, self.mode)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            FilterValue::Pattern(p) => write!(f, "{} ~ /{p}/", self.name),
        }
    }
}

/// A node of a compiled predicate tree.
///
/// # Invariants
///
/// - A leaf owns exactly one filter and has no children
/// - AND branches never directly contain AND branches, OR never OR
/// - An empty AND branch matches every row
/// - Node ids are unique within a tree
#[derive(Debug, Clone)]
pub enum FilterTreeNode {
    /// A single condition.
    Leaf {
        /// Node id.
        id: NodeId,
        /// The condition.
        filter: Filter,
    },
    /// A conjunction (`or_kind == false`) or disjunction of children.
    Branch {
        /// Node id.
        id: NodeId,
        /// True for OR, false for AND.
        or_kind: bool,
        /// Child nodes.
        children: Vec<FilterTreeNode>,
    },
}

impl FilterTreeNode {
    /// Creates a leaf.
    pub fn leaf(id: NodeId, filter: Filter) -> Self {
        FilterTreeNode::Leaf { id, filter }
    }

    /// Creates an AND branch.
    pub fn and(id: NodeId, children: Vec<FilterTreeNode>) -> Self {
        FilterTreeNode::Branch {
            id,
            or_kind: false,
            children,
        }
    }

    /// Creates an OR branch.
    pub fn or(id: NodeId, children: Vec<FilterTreeNode>) -> Self {
        FilterTreeNode::Branch {
            id,
            or_kind: true,
            children,
        }
    }

    /// Returns the node id.
    pub fn id(&self) -> NodeId {
        match self {
            FilterTreeNode::Leaf { id, .. } | FilterTreeNode::Branch { id, .. } => *id,
        }
    }

    /// Returns true for leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self, FilterTreeNode::Leaf { .. })
    }

    /// Returns true for OR branches.
    pub fn is_or(&self) -> bool {
        matches!(self, FilterTreeNode::Branch { or_kind: true, .. })
    }

    /// Returns true for AND branches.
    pub fn is_and(&self) -> bool {
        matches!(self, FilterTreeNode::Branch { or_kind: false, .. })
    }

    /// Returns true for an AND branch without children, which matches
    /// every row.
    pub fn is_match_all(&self) -> bool {
        matches!(
            self,
            FilterTreeNode::Branch { or_kind: false, children, .. } if children.is_empty()
        )
    }

    /// Returns the filter of a leaf.
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            FilterTreeNode::Leaf { filter, .. } => Some(filter),
            FilterTreeNode::Branch { .. } => None,
        }
    }

    /// Returns the children of a branch; leaves have none.
    pub fn children(&self) -> &[FilterTreeNode] {
        match self {
            FilterTreeNode::Leaf { .. } => &[],
            FilterTreeNode::Branch { children, .. } => children,
        }
    }

    /// Counts the nodes of this subtree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(FilterTreeNode::node_count)
            .sum::<usize>()
    }

    /// Visits every leaf of this subtree in pre-order.
    pub fn for_each_leaf<'a>(&'a self, visit: &mut impl FnMut(NodeId, &'a Filter)) {
        match self {
            FilterTreeNode::Leaf { id, filter } => visit(*id, filter),
            FilterTreeNode::Branch { children, .. } => {
                for child in children {
                    child.for_each_leaf(visit);
                }
            }
        }
    }
}

impl fmt::Display for FilterTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterTreeNode::Leaf { filter, .. } => write!(f, "{filter}"),
            FilterTreeNode::Branch {
                or_kind, children, ..
            } => {
                if children.is_empty() {
                    return f.write_str(if *or_kind { "FALSE" } else { "TRUE" });
                }
                let sep = if *or_kind { " OR " } else { " AND " };
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A compiled predicate tree, as returned by
/// [`crate::Condition::compile`].
///
/// Trees are immutable; scan progress lives in [`ScanMarks`].
#[derive(Debug, Clone)]
pub struct FilterTree {
    root: FilterTreeNode,
}

impl FilterTree {
    /// Wraps a root node.
    pub fn new(root: FilterTreeNode) -> Self {
        Self { root }
    }

    /// A tree matching every row.
    pub fn match_all() -> Self {
        Self::new(FilterTreeNode::and(NodeId::new(0), Vec::new()))
    }

    /// Returns the root node.
    pub fn root(&self) -> &FilterTreeNode {
        &self.root
    }

    /// Returns true if the tree matches every row.
    pub fn is_match_all(&self) -> bool {
        self.root.is_match_all()
    }

    /// Consumes the tree and returns the root node.
    pub fn into_root(self) -> FilterTreeNode {
        self.root
    }
}

impl fmt::Display for FilterTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

/// The set of nodes proven by index scans during one planning call.
///
/// A node is marked once an index scan fully proved its condition for every
/// row the scan returned. Marks are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanMarks {
    marked: HashSet<NodeId>,
}

impl ScanMarks {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a node as proven.
    pub fn mark(&mut self, id: NodeId) {
        self.marked.insert(id);
    }

    /// Returns true if the node is proven.
    pub fn is_marked(&self, id: NodeId) -> bool {
        self.marked.contains(&id)
    }

    /// Number of proven nodes.
    pub fn len(&self) -> usize {
        self.marked.len()
    }

    /// Returns true if nothing is proven.
    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Returns the proven node ids in ascending order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.marked.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
