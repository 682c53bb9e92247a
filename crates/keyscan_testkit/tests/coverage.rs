//! Coverage soundness: index plans never lose rows, and exact plans are
//! exactly the result set.

use keyscan_core::{
    Condition, ExecutionStrategy, IndexSpec, OrderedIndex, QueryConfig, QueryableIndex,
};
use keyscan_testkit::prelude::*;
use proptest::prelude::*;

fn indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new("a").field("a"),
        IndexSpec::new("bc").field("b").field("c"),
        IndexSpec::new("ed").field("e").field("d"),
    ]
}

proptest! {
    #![proptest_config(suite_config(Effort::Standard))]

    #[test]
    fn queries_match_linear_evaluation(
        rows in synthetic_rows_strategy(30),
        cond in condition_strategy(),
    ) {
        let fixture = TestTable::synthetic(&indexes(), &rows);
        prop_assert_eq!(fixture.query_ids(&cond), fixture.linear_ids(&cond));
    }

    #[test]
    fn plans_are_supersets(
        rows in synthetic_rows_strategy(30),
        cond in condition_strategy(),
    ) {
        let fixture = TestTable::synthetic(&indexes(), &rows);
        let tree = fixture.compile(&cond);
        let ctx = fixture.ctx();
        let plan = fixture.plan(&ctx, &tree).unwrap();
        let expected = fixture.linear_ids(&cond);

        if let Some(bits) = &plan.bits {
            for id in &expected {
                prop_assert!(bits.contains(*id), "plan lost row {}", id);
            }
            if plan.exact {
                prop_assert_eq!(bits.to_vec(), expected);
            }
        } else {
            prop_assert!(!plan.exact);
        }
    }

    #[test]
    fn planning_is_repeatable(
        rows in synthetic_rows_strategy(20),
        cond in condition_strategy(),
    ) {
        let fixture = TestTable::synthetic(&indexes(), &rows);
        let tree = fixture.compile(&cond);
        let before = tree.to_string();
        let ctx = fixture.ctx();

        let first = fixture.plan(&ctx, &tree).unwrap();
        let second = fixture.plan(&ctx, &tree).unwrap();
        prop_assert_eq!(first.bits, second.bits);
        prop_assert_eq!(first.exact, second.exact);
        prop_assert_eq!(first.proven.ids(), second.proven.ids());
        prop_assert_eq!(tree.to_string(), before);
    }

    #[test]
    fn can_match_is_pure(cond in condition_strategy()) {
        let schema = synthetic_schema();
        let tree = cond.compile(&schema).unwrap();
        for spec in indexes() {
            let index = OrderedIndex::new(&schema, &spec).unwrap();
            let verdicts: Vec<Vec<bool>> = (0..2)
                .map(|_| {
                    std::iter::once(tree.root())
                        .chain(tree.root().children())
                        .map(|node| index.can_match(node))
                        .collect()
                })
                .collect();
            prop_assert_eq!(&verdicts[0], &verdicts[1]);
            prop_assert_eq!(index.stats().queries(), 0);
            prop_assert_eq!(index.stats().not_applicable(), 0);
        }
    }

    #[test]
    fn disabling_indexes_changes_nothing(
        rows in synthetic_rows_strategy(30),
        cond in condition_strategy(),
    ) {
        let fixture = TestTable::synthetic(&indexes(), &rows);
        let tree = fixture.compile(&cond);
        let plain = fixture.ctx_with(QueryConfig::new().use_indexes(false));
        let indexed = fixture.ctx();
        let (a, plain_stats) = fixture
            .query_with_stats(&plain, &tree, Default::default())
            .unwrap();
        let (b, _) = fixture
            .query_with_stats(&indexed, &tree, Default::default())
            .unwrap();
        prop_assert_eq!(a, b);
        prop_assert!(matches!(
            plain_stats.strategy,
            ExecutionStrategy::FullScan | ExecutionStrategy::MatchAll | ExecutionStrategy::Empty
        ));
    }
}
