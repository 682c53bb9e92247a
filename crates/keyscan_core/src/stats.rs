//! Index and query statistics.
//!
//! [`IndexStats`] are long-lived atomic counters owned by each index.
//! [`PlanStats`] describe a single query execution.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one index.
///
/// All counters are atomic and can be read while scans are in progress.
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Number of scans that ran against the index.
    queries: AtomicU64,
    /// Number of prefix scans.
    prefix_scans: AtomicU64,
    /// Number of range scans.
    range_scans: AtomicU64,
    /// Total index keys visited.
    keys_scanned: AtomicU64,
    /// Number of compile calls that found the index not applicable.
    not_applicable: AtomicU64,
}

impl IndexStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_prefix_scan(&self, keys: u64) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.prefix_scans.fetch_add(1, Ordering::Relaxed);
        self.keys_scanned.fetch_add(keys, Ordering::Relaxed);
    }

    pub(crate) fn record_range_scan(&self, keys: u64) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.range_scans.fetch_add(1, Ordering::Relaxed);
        self.keys_scanned.fetch_add(keys, Ordering::Relaxed);
    }

    pub(crate) fn record_not_applicable(&self) {
        self.not_applicable.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of scans.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Returns the number of prefix scans.
    pub fn prefix_scans(&self) -> u64 {
        self.prefix_scans.load(Ordering::Relaxed)
    }

    /// Returns the number of range scans.
    pub fn range_scans(&self) -> u64 {
        self.range_scans.load(Ordering::Relaxed)
    }

    /// Returns the total index keys visited.
    pub fn keys_scanned(&self) -> u64 {
        self.keys_scanned.load(Ordering::Relaxed)
    }

    /// Returns how often the index was not applicable.
    pub fn not_applicable(&self) -> u64 {
        self.not_applicable.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> IndexStatsSnapshot {
        IndexStatsSnapshot {
            queries: self.queries(),
            prefix_scans: self.prefix_scans(),
            range_scans: self.range_scans(),
            keys_scanned: self.keys_scanned(),
            not_applicable: self.not_applicable(),
        }
    }
}

/// A point-in-time snapshot of [`IndexStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexStatsSnapshot {
    /// Number of scans.
    pub queries: u64,
    /// Number of prefix scans.
    pub prefix_scans: u64,
    /// Number of range scans.
    pub range_scans: u64,
    /// Total index keys visited.
    pub keys_scanned: u64,
    /// Number of not-applicable compile calls.
    pub not_applicable: u64,
}

/// How a query was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// The condition matches every row.
    #[default]
    MatchAll,
    /// The primary key range is unsatisfiable or the limit is zero; nothing
    /// was read.
    Empty,
    /// Index scans proved every condition; rows are fetched by id.
    IndexExact,
    /// Index scans narrowed the candidates; rows are re-checked.
    IndexResidual,
    /// No index applied; rows in the primary key range are scanned.
    FullScan,
}

/// Statistics for one query execution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanStats {
    /// Chosen strategy.
    pub strategy: ExecutionStrategy,
    /// Number of index scans run by the planner.
    pub index_scans: u64,
    /// Candidate row ids produced by the index plan.
    pub index_hits: u64,
    /// Rows read from the data bucket.
    pub rows_scanned: u64,
    /// Rows that satisfied the condition, counting those skipped by the
    /// offset. Execution stops once the limit is reached.
    pub rows_matched: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_stats_counters() {
        let stats = IndexStats::new();
        stats.record_prefix_scan(3);
        stats.record_range_scan(7);
        stats.record_not_applicable();

        let snap = stats.snapshot();
        assert_eq!(snap.queries, 2);
        assert_eq!(snap.prefix_scans, 1);
        assert_eq!(snap.range_scans, 1);
        assert_eq!(snap.keys_scanned, 10);
        assert_eq!(snap.not_applicable, 1);
    }

    #[test]
    fn plan_stats_default() {
        let stats = PlanStats::default();
        assert_eq!(stats.strategy, ExecutionStrategy::MatchAll);
        assert_eq!(stats.rows_scanned, 0);
    }
}
