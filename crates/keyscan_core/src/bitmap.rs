//! Row id bitmaps.

use std::fmt;

use roaring::RoaringTreemap;

use crate::types::RowId;

/// A compressed set of row ids.
///
/// Index scans produce one bitmap each; the planner combines them with
/// [`RowBitmap::and`], [`RowBitmap::or`] and [`RowBitmap::and_not`].
#[derive(Clone, Default, PartialEq)]
pub struct RowBitmap {
    bits: RoaringTreemap,
}

impl RowBitmap {
    /// Creates an empty bitmap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row id. Returns true if it was not present.
    pub fn set(&mut self, id: RowId) -> bool {
        self.bits.insert(id)
    }

    /// Removes a row id. Returns true if it was present.
    pub fn unset(&mut self, id: RowId) -> bool {
        self.bits.remove(id)
    }

    /// Returns true if the row id is present.
    pub fn contains(&self, id: RowId) -> bool {
        self.bits.contains(id)
    }

    /// Number of row ids in the set.
    pub fn count(&self) -> u64 {
        self.bits.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Intersects with `other` in place.
    pub fn and(&mut self, other: &RowBitmap) {
        self.bits &= &other.bits;
    }

    /// Unions with `other` in place.
    pub fn or(&mut self, other: &RowBitmap) {
        self.bits |= &other.bits;
    }

    /// Removes every id present in `other`.
    pub fn and_not(&mut self, other: &RowBitmap) {
        self.bits -= &other.bits;
    }

    /// Iterates row ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RowId> + '_ {
        self.bits.iter()
    }

    /// Collects the row ids in ascending order.
    pub fn to_vec(&self) -> Vec<RowId> {
        self.iter().collect()
    }
}

impl FromIterator<RowId> for RowBitmap {
    fn from_iter<I: IntoIterator<Item = RowId>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for RowBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count() <= 16 {
            f.debug_set().entries(self.iter()).finish()
        } else {
            write!(f, "RowBitmap<{} ids>", self.count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_count() {
        let mut bits = RowBitmap::new();
        assert!(bits.is_empty());
        assert!(bits.set(5));
        assert!(!bits.set(5));
        assert!(bits.set(u64::MAX));
        assert_eq!(bits.count(), 2);
        assert!(bits.contains(u64::MAX));
        assert!(bits.unset(5));
        assert_eq!(bits.to_vec(), vec![u64::MAX]);
    }

    #[test]
    fn set_operations() {
        let a: RowBitmap = [1, 2, 3, 4].into_iter().collect();
        let b: RowBitmap = [3, 4, 5].into_iter().collect();

        let mut and = a.clone();
        and.and(&b);
        assert_eq!(and.to_vec(), vec![3, 4]);

        let mut or = a.clone();
        or.or(&b);
        assert_eq!(or.to_vec(), vec![1, 2, 3, 4, 5]);

        let mut diff = a;
        diff.and_not(&b);
        assert_eq!(diff.to_vec(), vec![1, 2]);
    }

    #[test]
    fn debug_output() {
        let small: RowBitmap = [2, 1].into_iter().collect();
        assert_eq!(format!("{small:?}"), "{1, 2}");
        let large: RowBitmap = (0..100).collect();
        assert_eq!(format!("{large:?}"), "RowBitmap<100 ids>");
    }
}
