//! Query configuration.

use serde::Deserialize;

/// Configuration for query planning and execution.
///
/// Can be deserialized from any serde format; missing keys take their
/// default values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Whether the planner may use secondary indexes at all.
    pub use_indexes: bool,

    /// Number of keys or rows visited between cancellation checks
    /// (0 = never check).
    pub cancel_check_interval: usize,

    /// Full scans visiting more rows than this log a warning.
    pub scan_warning_threshold: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            use_indexes: true,
            cancel_check_interval: 1024,
            scan_warning_threshold: 100_000,
        }
    }
}

impl QueryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the planner may use indexes.
    #[must_use]
    pub const fn use_indexes(mut self, value: bool) -> Self {
        self.use_indexes = value;
        self
    }

    /// Sets the cancellation check interval.
    #[must_use]
    pub const fn cancel_check_interval(mut self, value: usize) -> Self {
        self.cancel_check_interval = value;
        self
    }

    /// Sets the full scan warning threshold.
    #[must_use]
    pub const fn scan_warning_threshold(mut self, value: u64) -> Self {
        self.scan_warning_threshold = value;
        self
    }
}

/// Paging options applied after residual matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// Number of matching rows to skip.
    pub offset: usize,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
}

impl QueryOptions {
    /// Creates options that return every matching row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Sets the offset.
    #[must_use]
    pub const fn offset(mut self, value: usize) -> Self {
        self.offset = value;
        self
    }

    /// Sets the limit.
    #[must_use]
    pub const fn limit(mut self, value: usize) -> Self {
        self.limit = Some(value);
        self
    }
}
