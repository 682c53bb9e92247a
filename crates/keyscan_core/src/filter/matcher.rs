//! Precompiled per-filter value matchers.

use std::cmp::Ordering;

use keyscan_codec::Value;
use regex::Regex;

use super::mode::FilterMode;
use super::node::FilterValue;
use crate::error::{CoreError, CoreResult};

/// A comparator built once per filter when a condition is compiled.
///
/// Values passed to [`Matcher::matches`] are compared with
/// [`Value::compare`]; incomparable values never match.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Single-value comparison.
    Compare {
        /// One of Equal, NotEqual, Lt, Le, Gt, Ge.
        mode: FilterMode,
        /// Right-hand operand.
        value: Value,
    },
    /// Inclusive range.
    Between {
        /// Lower bound.
        lo: Value,
        /// Upper bound.
        hi: Value,
    },
    /// Membership in a sorted, deduplicated list.
    Member {
        /// Sorted list.
        values: Vec<Value>,
        /// Whether membership is negated (NotIn).
        negate: bool,
    },
    /// Regular expression over text.
    Pattern(Regex),
}

impl Matcher {
    /// Builds the matcher for `mode` and an already cast `value`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCondition`] when the value shape does not
    /// fit the mode or the pattern does not compile.
    pub fn compile(mode: FilterMode, value: &FilterValue) -> CoreResult<Self> {
        match (mode, value) {
            (
                FilterMode::Equal
                | FilterMode::NotEqual
                | FilterMode::Lt
                | FilterMode::Le
                | FilterMode::Gt
                | FilterMode::Ge,
                FilterValue::Scalar(v),
            ) => Ok(Matcher::Compare {
                mode,
                value: v.clone(),
            }),
            (FilterMode::Range, FilterValue::Range(lo, hi)) => Ok(Matcher::Between {
                lo: lo.clone(),
                hi: hi.clone(),
            }),
            (FilterMode::In | FilterMode::NotIn, FilterValue::List(values)) => {
                Ok(Matcher::Member {
                    values: values.clone(),
                    negate: mode == FilterMode::NotIn,
                })
            }
            (FilterMode::Regexp, FilterValue::Pattern(p)) => Regex::new(p)
                .map(Matcher::Pattern)
                .map_err(|e| CoreError::invalid_condition(format!("bad pattern {p:?}: {e}"))),
            (FilterMode::Invalid, _) => Err(CoreError::invalid_condition("invalid filter mode")),
            (mode, value) => Err(CoreError::invalid_condition(format!(
                "mode {} does not accept a {} value",
                mode.tag(),
                value.shape()
            ))),
        }
    }

    /// Returns true if `v` satisfies the filter.
    pub fn matches(&self, v: &Value) -> bool {
        match self {
            Matcher::Compare { mode, value } => {
                let Some(ord) = v.compare(value) else {
                    return false;
                };
                match mode {
                    FilterMode::Equal => ord == Ordering::Equal,
                    FilterMode::NotEqual => ord != Ordering::Equal,
                    FilterMode::Lt => ord == Ordering::Less,
                    FilterMode::Le => ord != Ordering::Greater,
                    FilterMode::Gt => ord == Ordering::Greater,
                    FilterMode::Ge => ord != Ordering::Less,
                    _ => false,
                }
            }
            Matcher::Between { lo, hi } => {
                matches!(v.compare(lo), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(v.compare(hi), Some(Ordering::Less | Ordering::Equal))
            }
            Matcher::Member { values, negate } => {
                let found = values
                    .binary_search_by(|item| item.compare(v).unwrap_or(Ordering::Less))
                    .is_ok();
                found != *negate
            }
            Matcher::Pattern(re) => match v {
                Value::Text(s) => re.is_match(s),
                Value::Bytes(b) => std::str::from_utf8(b).is_ok_and(|s| re.is_match(s)),
                _ => false,
            },
        }
    }
}
