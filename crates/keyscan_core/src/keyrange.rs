//! Byte-range utilities for scan bounds.

use std::fmt;

/// The smallest key.
pub const ZERO: &[u8] = &[];

/// The "largest key" sentinel byte.
pub const FF: &[u8] = &[0xFF];

/// Returns `len` repetitions of the [`FF`] sentinel.
pub fn ff_sentinel(len: usize) -> Vec<u8> {
    vec![0xFF; len]
}

/// Returns the prefix limit of `prefix`.
///
/// The limit is the smallest byte string strictly greater than every string
/// starting with `prefix` that does not itself start with `prefix`. It is the
/// exclusive upper bound of a prefix scan.
///
/// Returns `None` when no such string exists (empty prefix, or a prefix made
/// only of `0xFF` bytes); the scan is then unbounded above.
///
/// ```
/// use keyscan_core::prefix_limit;
///
/// assert_eq!(prefix_limit(&[0x01, 0xFF]), Some(vec![0x02]));
/// assert_eq!(prefix_limit(&[0xFF, 0xFF]), None);
/// ```
pub fn prefix_limit(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b < 0xFF)?;
    let mut limit = prefix[..=last].to_vec();
    limit[last] += 1;
    Some(limit)
}

/// A half-open key interval `[from, to)`.
///
/// `to == None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyRange {
    /// Inclusive lower bound.
    pub from: Vec<u8>,
    /// Exclusive upper bound.
    pub to: Option<Vec<u8>>,
}

impl KeyRange {
    /// Creates a range.
    pub fn new(from: Vec<u8>, to: Option<Vec<u8>>) -> Self {
        Self { from, to }
    }

    /// The range covering every key that starts with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            from: prefix.to_vec(),
            to: prefix_limit(prefix),
        }
    }

    /// Returns true if `key` lies inside the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.from.as_slice() && self.below_upper(key)
    }

    /// Returns true if `key` is below the exclusive upper bound.
    pub fn below_upper(&self, key: &[u8]) -> bool {
        match self.to.as_deref() {
            Some(to) => key < to,
            None => true,
        }
    }

    /// Returns true if no key can lie inside the range.
    pub fn is_empty(&self) -> bool {
        self.to
            .as_deref()
            .is_some_and(|to| to <= self.from.as_slice())
    }
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_hex(f, &self.from)?;
        f.write_str(", ")?;
        match &self.to {
            Some(to) => write_hex(f, to)?,
            None => f.write_str("inf")?,
        }
        f.write_str(")")
    }
}
