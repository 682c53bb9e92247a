//! Core type definitions for keyscan.

use std::fmt;

/// Row identifier. Equal to the row's primary key.
pub type RowId = u64;

/// Smallest legal primary key.
pub const MIN_PK: RowId = 1;

/// Largest legal primary key.
pub const MAX_PK: RowId = u64::MAX;

/// The illegal primary key. Used to build unsatisfiable ranges.
pub const NO_PK: RowId = 0;

/// Identifier for a field within a table schema.
///
/// Field ids are assigned in declaration order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub u16);

impl FieldId {
    /// Creates a new field ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field:{}", self.0)
    }
}

/// Identifier for a node in a compiled filter tree.
///
/// Assigned in pre-order by the condition compiler, unique within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Creates a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(FieldId::new(3).to_string(), "field:3");
        assert_eq!(NodeId::new(0).to_string(), "node:0");
    }

    #[test]
    fn pk_constants() {
        assert!(NO_PK < MIN_PK);
        assert_eq!(MAX_PK, u64::MAX);
    }
}
