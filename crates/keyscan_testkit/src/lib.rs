//! # keyscan testkit
//!
//! Test utilities for keyscan.
//!
//! This crate provides:
//! - Table fixtures over an in-memory store, with a linear reference
//!   evaluator
//! - Property-based generators for rows and conditions using proptest
//! - Logging setup for tests
//!
//! ## Usage
//!
//! ```
//! use keyscan_core::{Condition, IndexSpec};
//! use keyscan_testkit::prelude::*;
//!
//! let fixture = TestTable::synthetic(&[IndexSpec::new("a").field("a")], &synthetic_rows(50));
//! let cond = Condition::ge("a", 2);
//! assert_eq!(fixture.query_ids(&cond), fixture.linear_ids(&cond));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::init_logging;
