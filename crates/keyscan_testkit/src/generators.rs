//! Property-based test generators using proptest.
//!
//! Strategies produce synthetic rows and conditions over the synthetic
//! schema. Value ranges are kept narrow so generated conditions hit both
//! matching and non-matching rows.

use keyscan_codec::Value;
use keyscan_core::{Condition, FilterMode, FilterValue};
use proptest::prelude::*;

use crate::fixtures::SyntheticRow;

static WORDS: [&str; 6] = ["", "a", "ab", "abc", "b", "a\0b"];

/// Strategy for short text drawn from a small alphabet.
pub fn word_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(WORDS.as_slice()).prop_map(str::to_string)
}

/// Strategy for the field values of one synthetic row.
fn row_values() -> impl Strategy<Value = (i32, i64, String, f64, u8)> {
    (
        -8i32..8,
        prop_oneof![Just(i64::MIN), Just(i64::MAX), -5i64..5],
        word_strategy(),
        (-6i32..6).prop_map(|v| f64::from(v) * 0.5),
        prop_oneof![Just(0u8), Just(255u8), 0u8..4],
    )
}

/// Strategy for synthetic rows with ids `1..=n`, `n` in `1..max`.
pub fn synthetic_rows_strategy(max: usize) -> impl Strategy<Value = Vec<SyntheticRow>> {
    prop::collection::vec(row_values(), 1..max).prop_map(|values| {
        values
            .into_iter()
            .zip(1u64..)
            .map(|((a, b, c, d, e), id)| SyntheticRow { id, a, b, c, d, e })
            .collect()
    })
}

/// Strategy for a value fitting `field` of the synthetic schema.
pub fn field_value_strategy(field: &'static str) -> BoxedStrategy<Value> {
    match field {
        "id" => (0u64..40).prop_map(Value::UInt).boxed(),
        "a" => (-9i64..9).prop_map(Value::Int).boxed(),
        "b" => prop_oneof![Just(i64::MIN), Just(i64::MAX), -6i64..6]
            .prop_map(Value::Int)
            .boxed(),
        "c" => word_strategy().prop_map(Value::Text).boxed(),
        "d" => (-7i32..7)
            .prop_map(|v| Value::Float(f64::from(v) * 0.5))
            .boxed(),
        _ => prop_oneof![Just(0u64), Just(255u64), 0u64..5]
            .prop_map(Value::UInt)
            .boxed(),
    }
}

/// Strategy for range-scannable modes.
pub fn scannable_mode_strategy() -> impl Strategy<Value = FilterMode> {
    prop::sample::select(vec![
        FilterMode::Equal,
        FilterMode::Lt,
        FilterMode::Le,
        FilterMode::Gt,
        FilterMode::Ge,
        FilterMode::Range,
    ])
}

/// Strategy for a leaf on `field` whose mode admits a range scan.
pub fn scannable_leaf_strategy(field: &'static str) -> impl Strategy<Value = Condition> {
    (
        scannable_mode_strategy(),
        field_value_strategy(field),
        field_value_strategy(field),
    )
        .prop_map(move |(mode, v, w)| match mode {
            FilterMode::Range => Condition::leaf(field, mode, FilterValue::Range(v, w)),
            _ => Condition::leaf(field, mode, FilterValue::Scalar(v)),
        })
}

/// Strategy for a leaf on `field` with any mode except regexp.
pub fn leaf_strategy(field: &'static str) -> impl Strategy<Value = Condition> {
    let list = prop::collection::vec(field_value_strategy(field), 0..4);
    prop_oneof![
        3 => scannable_leaf_strategy(field),
        1 => field_value_strategy(field).prop_map(move |v| Condition::not_equal(field, v)),
        1 => list.clone().prop_map(move |vs| Condition::in_list(field, vs)),
        1 => list.prop_map(move |vs| Condition::not_in(field, vs)),
    ]
}

/// Strategy for a leaf on any synthetic field.
pub fn any_leaf_strategy() -> impl Strategy<Value = Condition> {
    prop_oneof![
        leaf_strategy("id"),
        leaf_strategy("a"),
        leaf_strategy("b"),
        leaf_strategy("c"),
        leaf_strategy("d"),
        leaf_strategy("e"),
    ]
}

/// Strategy for AND/OR trees of leaves, up to three levels deep.
pub fn condition_strategy() -> impl Strategy<Value = Condition> {
    any_leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Condition::and),
            prop::collection::vec(inner, 0..4).prop_map(Condition::or),
        ]
    })
}

/// How hard a property test suite searches.
///
/// The `KEYSCAN_PROPTEST` environment variable (`quick`, `standard` or
/// `thorough`) overrides the effort a suite asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effort {
    /// A few dozen cases, for helpers and smoke checks.
    Quick,
    /// The everyday setting.
    #[default]
    Standard,
    /// Long soak runs.
    Thorough,
}

impl Effort {
    /// Environment variable read by [`Effort::from_env`].
    pub const ENV: &'static str = "KEYSCAN_PROPTEST";

    /// Parses an effort name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "quick" => Some(Effort::Quick),
            "standard" => Some(Effort::Standard),
            "thorough" => Some(Effort::Thorough),
            _ => None,
        }
    }

    /// Effort named by [`Effort::ENV`], or `fallback`.
    pub fn from_env(fallback: Self) -> Self {
        std::env::var(Self::ENV)
            .ok()
            .and_then(|name| Self::parse(&name))
            .unwrap_or(fallback)
    }

    /// Number of generated cases.
    pub fn cases(self) -> u32 {
        match self {
            Effort::Quick => 32,
            Effort::Standard => 256,
            Effort::Thorough => 4096,
        }
    }
}

/// Proptest configuration for a suite asking for `effort`.
pub fn suite_config(effort: Effort) -> ProptestConfig {
    let cases = Effort::from_env(effort).cases();
    ProptestConfig {
        cases,
        max_shrink_iters: cases * 4,
        ..ProptestConfig::default()
    }
}
