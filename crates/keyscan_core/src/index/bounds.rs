//! Translation of filters into key bounds.
//!
//! Given the encoded equality prefix of the leading index fields and one
//! more filter on the next field, computes the key interval holding exactly
//! the rows the filter admits:
//!
//! | mode  | from                    | to                        |
//! |-------|-------------------------|---------------------------|
//! | Equal | prefix scan on `p‖v`    |                           |
//! | Lt    | `p`                     | `p‖v`                     |
//! | Le    | `p`                     | `limit(p‖v)`              |
//! | Gt    | `limit(p‖v)`            | `limit(p)`                |
//! | Ge    | `p‖v`                   | `limit(p)`                |
//! | Range | `p‖lo`                  | `limit(p‖hi)`             |
//!
//! Value encodings are prefix-free, so `limit(p‖v)` bounds every key whose
//! field equals `v` regardless of the trailing fields and row id.

use std::fmt;

use keyscan_codec::{encode_value, EncodingConfig, Value};

use crate::error::{CoreError, CoreResult};
use crate::filter::{Filter, FilterMode, FilterValue};
use crate::keyrange::{prefix_limit, KeyRange};

/// The keys an index scan must visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanBounds {
    /// Every key starting with the prefix.
    Prefix(Vec<u8>),
    /// Every key inside the range.
    Range(KeyRange),
    /// No key can match.
    Empty,
}

impl fmt::Display for ScanBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanBounds::Prefix(p) => write!(f, "prefix {}", KeyRange::prefix(p)),
            ScanBounds::Range(r) => write!(f, "range {r}"),
            ScanBounds::Empty => f.write_str("empty"),
        }
    }
}

/// Appends the order-preserving encoding of `value` to a copy of `prefix`.
pub(crate) fn extend_key(prefix: &[u8], filter: &Filter, value: &Value) -> CoreResult<Vec<u8>> {
    let mut key = prefix.to_vec();
    encode_value(&mut key, filter.field_type, value, &EncodingConfig::ordered())?;
    Ok(key)
}

/// Computes the bounds for `filter` on the field following `prefix`.
///
/// Returns `Ok(None)` for modes that do not admit a contiguous range, and
/// for values whose encoding is empty.
pub fn leaf_bounds(prefix: &[u8], filter: &Filter) -> CoreResult<Option<ScanBounds>> {
    if !filter.mode.is_range_scannable() {
        return Ok(None);
    }

    if let (FilterMode::Range, FilterValue::Range(lo, hi)) = (filter.mode, &filter.value) {
        let from = extend_key(prefix, filter, lo)?;
        let upper = extend_key(prefix, filter, hi)?;
        if from.len() == prefix.len() || upper.len() == prefix.len() {
            return Ok(None);
        }
        return Ok(Some(ScanBounds::Range(KeyRange::new(
            from,
            prefix_limit(&upper),
        ))));
    }

    let value = filter.value.as_scalar().ok_or_else(|| {
        CoreError::invalid_condition(format!(
            "mode {} needs a scalar operand on {}",
            filter.mode.tag(),
            filter.name
        ))
    })?;
    let key = extend_key(prefix, filter, value)?;
    if key.len() == prefix.len() {
        return Ok(None);
    }

    let bounds = match filter.mode {
        FilterMode::Equal => ScanBounds::Prefix(key),
        FilterMode::Lt => ScanBounds::Range(KeyRange::new(prefix.to_vec(), Some(key))),
        FilterMode::Le => ScanBounds::Range(KeyRange::new(prefix.to_vec(), prefix_limit(&key))),
        FilterMode::Gt => match prefix_limit(&key) {
            Some(from) => ScanBounds::Range(KeyRange::new(from, prefix_limit(prefix))),
            None => ScanBounds::Empty,
        },
        FilterMode::Ge => ScanBounds::Range(KeyRange::new(key, prefix_limit(prefix))),
        _ => {
            return Err(CoreError::invalid_condition(format!(
                "mode {} on {} has a {} operand",
                filter.mode.tag(),
                filter.name,
                filter.value.shape()
            )))
        }
    };
    Ok(Some(bounds))
}
