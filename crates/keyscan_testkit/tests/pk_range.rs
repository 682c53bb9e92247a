//! Primary key narrowing properties.

use keyscan_core::{pk_range, Condition, PkRange};
use keyscan_testkit::prelude::*;
use proptest::prelude::*;

fn pk_leaf() -> impl Strategy<Value = Condition> {
    leaf_strategy("id")
}

fn range_of(cond: &Condition) -> PkRange {
    let schema = synthetic_schema();
    let tree = cond.compile(&schema).unwrap();
    pk_range(tree.root(), &schema)
}

fn within(inner: PkRange, outer: PkRange) -> bool {
    inner.is_empty() || (!outer.is_empty() && outer.min <= inner.min && inner.max <= outer.max)
}

proptest! {
    #![proptest_config(suite_config(Effort::Standard))]

    #[test]
    fn and_stays_within_intersection(x in pk_leaf(), y in pk_leaf()) {
        // Merged IN lists can be tighter than the intersection of their hulls.
        let both = range_of(&Condition::and(vec![x.clone(), y.clone()]));
        let bound = range_of(&x).intersect(range_of(&y));
        prop_assert!(within(both, bound), "{} outside {}", both, bound);
    }

    #[test]
    fn or_unions(x in pk_leaf(), y in pk_leaf()) {
        let either = range_of(&Condition::or(vec![x.clone(), y.clone()]));
        prop_assert_eq!(either, range_of(&x).union(range_of(&y)));
    }

    #[test]
    fn matching_rows_lie_inside(
        rows in synthetic_rows_strategy(40),
        cond in condition_strategy(),
    ) {
        let fixture = TestTable::synthetic(&[], &rows);
        let range = range_of(&cond);
        for id in fixture.linear_ids(&cond) {
            prop_assert!(range.contains(id), "row {} outside {}", id, range);
        }
    }

    #[test]
    fn pk_range_is_repeatable(cond in condition_strategy()) {
        let schema = synthetic_schema();
        let tree = cond.compile(&schema).unwrap();
        prop_assert_eq!(pk_range(tree.root(), &schema), pk_range(tree.root(), &schema));
    }
}

#[test]
fn empty_tree_is_full() {
    assert_eq!(range_of(&Condition::and(vec![])), PkRange::FULL);
}

#[test]
fn unsatisfiable_tree_is_empty() {
    assert!(range_of(&Condition::or(vec![])).is_empty());
    assert!(range_of(&Condition::and(vec![
        Condition::ge("id", 30u64),
        Condition::le("id", 10u64),
    ]))
    .is_empty());
}

#[test]
fn intersected_lists_narrow_the_range() {
    let cond = Condition::and(vec![
        Condition::in_list("id", [1u64, 3, 5]),
        Condition::in_list("id", [3u64, 9]),
    ]);
    assert_eq!(range_of(&cond), PkRange::new(3, 3));
}
