//! Differential tests: index scans against a linear walk over every row.

use keyscan_core::{Condition, ExecutionStrategy, IndexSpec};
use keyscan_testkit::prelude::*;
use proptest::prelude::*;

static FIELDS: [&str; 5] = ["a", "b", "c", "d", "e"];

fn field_and_leaf() -> impl Strategy<Value = (&'static str, Condition)> {
    prop::sample::select(FIELDS.as_slice())
        .prop_flat_map(|field| (Just(field), scannable_leaf_strategy(field)))
}

fn field_pair() -> impl Strategy<Value = (&'static str, &'static str)> {
    (
        prop::sample::select(FIELDS.as_slice()),
        prop::sample::select(FIELDS.as_slice()),
    )
        .prop_filter("distinct fields", |(x, y)| x != y)
}

proptest! {
    #![proptest_config(suite_config(Effort::Standard))]

    #[test]
    fn single_field_scan_matches_linear(
        rows in synthetic_rows_strategy(40),
        (field, cond) in field_and_leaf(),
    ) {
        let fixture = TestTable::synthetic(&[IndexSpec::new("ix").field(field)], &rows);
        let (ids, stats) = fixture.run(&cond).unwrap();
        prop_assert_eq!(stats.strategy, ExecutionStrategy::IndexExact);
        prop_assert_eq!(ids, fixture.linear_ids(&cond));
    }

    #[test]
    fn composite_scan_matches_linear(
        rows in synthetic_rows_strategy(40),
        (lead, next, eq, extra) in field_pair().prop_flat_map(|(lead, next)| (
            Just(lead),
            Just(next),
            field_value_strategy(lead),
            scannable_leaf_strategy(next),
        )),
    ) {
        let spec = IndexSpec::new("ix").field(lead).field(next);
        let fixture = TestTable::synthetic(&[spec], &rows);
        let cond = Condition::and(vec![Condition::equal(lead, eq), extra]);
        let (ids, stats) = fixture.run(&cond).unwrap();
        prop_assert_eq!(stats.strategy, ExecutionStrategy::IndexExact);
        prop_assert_eq!(ids, fixture.linear_ids(&cond));
    }

    #[test]
    fn composite_range_on_leading_field_matches_linear(
        rows in synthetic_rows_strategy(40),
        (lead, next, first, second) in field_pair().prop_flat_map(|(lead, next)| (
            Just(lead),
            Just(next),
            scannable_leaf_strategy(lead),
            scannable_leaf_strategy(next),
        )),
    ) {
        let spec = IndexSpec::new("ix").field(lead).field(next);
        let fixture = TestTable::synthetic(&[spec], &rows);
        let cond = Condition::and(vec![first, second]);
        prop_assert_eq!(fixture.query_ids(&cond), fixture.linear_ids(&cond));
    }
}

#[test]
fn fixed_rows_cover_every_mode() {
    let rows = synthetic_rows(60);
    let fixture = TestTable::synthetic(
        &[IndexSpec::new("a").field("a"), IndexSpec::new("cd").field("c").field("d")],
        &rows,
    );
    let conds = [
        Condition::lt("a", -2),
        Condition::le("a", 0),
        Condition::gt("a", 4),
        Condition::ge("a", 5),
        Condition::range("a", -1, 1),
        Condition::equal("c", "ant"),
        Condition::gt("c", "an"),
        Condition::and(vec![Condition::equal("c", "b\0x"), Condition::ge("d", 0.0)]),
        Condition::and(vec![Condition::equal("c", ""), Condition::range("d", -1.0, 1.0)]),
    ];
    for cond in &conds {
        assert_eq!(fixture.query_ids(cond), fixture.linear_ids(cond), "{cond:?}");
    }
}
