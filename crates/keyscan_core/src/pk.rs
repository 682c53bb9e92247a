//! Primary key bound narrowing.

use std::fmt;

use keyscan_codec::Value;

use crate::filter::{FilterMode, FilterTreeNode, FilterValue};
use crate::schema::Schema;
use crate::types::{RowId, MAX_PK, MIN_PK, NO_PK};

/// An inclusive range of primary keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PkRange {
    /// Smallest primary key that may match.
    pub min: RowId,
    /// Largest primary key that may match.
    pub max: RowId,
}

impl PkRange {
    /// Every legal primary key.
    pub const FULL: PkRange = PkRange {
        min: MIN_PK,
        max: MAX_PK,
    };

    /// The unsatisfiable range.
    pub const EMPTY: PkRange = PkRange {
        min: NO_PK,
        max: NO_PK,
    };

    /// Creates a range, normalising unsatisfiable bounds to [`PkRange::EMPTY`].
    pub fn new(min: RowId, max: RowId) -> Self {
        let min = min.max(MIN_PK);
        if min > max {
            Self::EMPTY
        } else {
            Self { min, max }
        }
    }

    /// Returns true if no legal primary key lies in the range.
    pub fn is_empty(&self) -> bool {
        self.max == NO_PK || self.min > self.max
    }

    /// Returns true if `pk` lies in the range.
    pub fn contains(&self, pk: RowId) -> bool {
        !self.is_empty() && pk >= self.min && pk <= self.max
    }

    /// Intersection of two ranges.
    #[must_use]
    pub fn intersect(self, other: PkRange) -> PkRange {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Smallest range covering both ranges.
    #[must_use]
    pub fn union(self, other: PkRange) -> PkRange {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self::new(self.min.min(other.min), self.max.max(other.max)),
        }
    }
}

impl Default for PkRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Display for PkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Derives primary key bounds from a predicate tree.
///
/// The result is a superset of the keys of every matching row: AND
/// intersects its children, OR unions them, and any leaf that does not
/// constrain the primary key contributes [`PkRange::FULL`].
pub fn pk_range(node: &FilterTreeNode, schema: &Schema) -> PkRange {
    match node {
        FilterTreeNode::Leaf { filter, .. } => {
            if filter.field_id != schema.primary().id {
                return PkRange::FULL;
            }
            leaf_range(filter.mode, &filter.value)
        }
        FilterTreeNode::Branch {
            or_kind: false,
            children,
            ..
        } => children
            .iter()
            .fold(PkRange::FULL, |acc, child| acc.intersect(pk_range(child, schema))),
        FilterTreeNode::Branch { children, .. } => children
            .iter()
            .fold(PkRange::EMPTY, |acc, child| acc.union(pk_range(child, schema))),
    }
}

fn leaf_range(mode: FilterMode, value: &FilterValue) -> PkRange {
    let scalar = || value.as_scalar().and_then(Value::as_u64);
    match (mode, value) {
        (FilterMode::Equal, _) => scalar().map_or(PkRange::FULL, |v| PkRange::new(v, v)),
        (FilterMode::Range, FilterValue::Range(lo, hi)) => match (lo.as_u64(), hi.as_u64()) {
            (Some(lo), Some(hi)) => PkRange::new(lo, hi),
            _ => PkRange::FULL,
        },
        (FilterMode::In, FilterValue::List(values)) => {
            let ids: Option<Vec<u64>> = values.iter().map(Value::as_u64).collect();
            match ids {
                Some(ids) => {
                    let legal = ids.iter().copied().filter(|&id| id >= MIN_PK);
                    let min = legal.clone().min().unwrap_or(NO_PK);
                    let max = legal.max().unwrap_or(NO_PK);
                    PkRange::new(min, max)
                }
                None => PkRange::FULL,
            }
        }
        (FilterMode::Gt, _) => match scalar() {
            Some(MAX_PK) => PkRange::EMPTY,
            Some(v) => PkRange::new(v + 1, MAX_PK),
            None => PkRange::FULL,
        },
        (FilterMode::Ge, _) => scalar().map_or(PkRange::FULL, |v| PkRange::new(v, MAX_PK)),
        (FilterMode::Lt, _) => match scalar() {
            Some(v) if v <= MIN_PK => PkRange::EMPTY,
            Some(v) => PkRange::new(MIN_PK, v - 1),
            None => PkRange::FULL,
        },
        (FilterMode::Le, _) => match scalar() {
            Some(NO_PK) => PkRange::EMPTY,
            Some(v) => PkRange::new(MIN_PK, v),
            None => PkRange::FULL,
        },
        _ => PkRange::FULL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Condition;
    use keyscan_codec::FieldType;

    fn schema() -> Schema {
        Schema::builder("t")
            .primary_key("id")
            .field("a", FieldType::Int32)
            .build()
            .unwrap()
    }

    fn range_of(cond: Condition) -> PkRange {
        let schema = schema();
        let tree = cond.compile(&schema).unwrap();
        pk_range(tree.root(), &schema)
    }

    #[test]
    fn half_open_bounds_intersect() {
        let r = range_of(Condition::and(vec![
            Condition::ge("id", 10u64),
            Condition::lt("id", 20u64),
        ]));
        assert_eq!(r, PkRange::new(10, 19));
    }

    #[test]
    fn or_unions_points() {
        let r = range_of(Condition::or(vec![
            Condition::equal("id", 1u64),
            Condition::equal("id", 100u64),
        ]));
        assert_eq!(r, PkRange::new(1, 100));
    }

    #[test]
    fn unconstrained_trees_are_full() {
        assert_eq!(range_of(Condition::and(vec![])), PkRange::FULL);
        assert_eq!(range_of(Condition::equal("a", 4)), PkRange::FULL);
        assert_eq!(range_of(Condition::not_equal("id", 4u64)), PkRange::FULL);
        assert_eq!(
            range_of(Condition::or(vec![
                Condition::equal("id", 3u64),
                Condition::equal("a", 1),
            ])),
            PkRange::FULL
        );
    }

    #[test]
    fn leaf_modes() {
        assert_eq!(range_of(Condition::in_list("id", [9u64, 4, 6])), PkRange::new(4, 9));
        assert_eq!(range_of(Condition::range("id", 3u64, 8u64)), PkRange::new(3, 8));
        assert_eq!(range_of(Condition::gt("id", 5u64)), PkRange::new(6, MAX_PK));
        assert_eq!(range_of(Condition::le("id", 5u64)), PkRange::new(1, 5));
        assert_eq!(range_of(Condition::ge("id", 0u64)), PkRange::FULL);
    }

    #[test]
    fn unsatisfiable_ranges() {
        assert!(range_of(Condition::in_list("id", Vec::<u64>::new())).is_empty());
        assert!(range_of(Condition::in_list("id", [0u64])).is_empty());
        assert_eq!(range_of(Condition::in_list("id", [0u64, 7, 3])), PkRange::new(3, 7));
        assert_eq!(
            range_of(Condition::in_list("id", Vec::<u64>::new())),
            PkRange::EMPTY
        );
        assert!(range_of(Condition::gt("id", u64::MAX)).is_empty());
        assert!(range_of(Condition::lt("id", 1u64)).is_empty());
        assert!(range_of(Condition::le("id", 0u64)).is_empty());
        assert!(range_of(Condition::range("id", 9u64, 2u64)).is_empty());
        assert!(range_of(Condition::and(vec![
            Condition::lt("id", 5u64),
            Condition::gt("id", 10u64),
        ]))
        .is_empty());
    }

    #[test]
    fn range_helpers() {
        let a = PkRange::new(5, 10);
        assert!(a.contains(5));
        assert!(!a.contains(11));
        assert!(!PkRange::EMPTY.contains(0));
        assert_eq!(a.union(PkRange::EMPTY), a);
        assert_eq!(a.intersect(PkRange::new(8, 20)), PkRange::new(8, 10));
        assert_eq!(a.to_string(), "[5, 10]");
    }
}
