//! Predicate model.
//!
//! Conditions are written as [`Condition`] values, compiled against a schema
//! into an immutable [`FilterTree`], and then planned against indexes. Which
//! leaves an index scan has already proven is tracked separately in
//! [`ScanMarks`], so the same tree can be planned any number of times.

mod condition;
mod matcher;
mod mode;
mod node;

pub use condition::Condition;
pub use matcher::Matcher;
pub use mode::FilterMode;
pub use node::{Filter, FilterTree, FilterTreeNode, FilterValue, ScanMarks};
