//! Execution context for one query.

use std::cell::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keyscan_storage::{KvStore, StorageTx};

use crate::config::QueryConfig;
use crate::error::{CoreError, CoreResult};

/// A shared cancellation flag.
///
/// Clones observe the same flag, so a token handed to a query can be
/// cancelled from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Ambient state for compiling and executing one query.
///
/// All reads of a query go through a single read-only transaction opened
/// lazily by [`QueryContext::read_tx`]. The transaction is released when the
/// context is dropped.
pub struct QueryContext<'s> {
    store: &'s dyn KvStore,
    tx: OnceCell<Box<dyn StorageTx + 's>>,
    config: QueryConfig,
    cancel: CancelToken,
}

impl<'s> QueryContext<'s> {
    /// Creates a context over `store` with the default configuration.
    pub fn new(store: &'s dyn KvStore) -> Self {
        Self {
            store,
            tx: OnceCell::new(),
            config: QueryConfig::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns the cancellation token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Returns the query's read transaction, opening it on first use.
    ///
    /// The transaction is never writable; index lookups do not mutate.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the transaction cannot be opened.
    pub fn read_tx(&self) -> CoreResult<&(dyn StorageTx + 's)> {
        if let Some(tx) = self.tx.get() {
            return Ok(tx.as_ref());
        }
        let store: &'s dyn KvStore = self.store;
        let tx = store.begin(false)?;
        Ok(self.tx.get_or_init(|| tx).as_ref())
    }

    /// Fails with [`CoreError::Cancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cancelled`].
    pub fn check_cancelled(&self) -> CoreResult<()> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        Ok(())
    }

    /// Polls the cancellation token every `cancel_check_interval` steps.
    pub(crate) fn poll_cancelled(&self, step: u64) -> CoreResult<()> {
        let interval = self.config.cancel_check_interval as u64;
        if interval != 0 && step % interval == 0 {
            self.check_cancelled()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("tx_open", &self.tx.get().is_some())
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscan_storage::InMemoryStore;

    #[test]
    fn read_tx_is_lazy_and_read_only() {
        let store = InMemoryStore::new();
        let ctx = QueryContext::new(&store);
        assert!(format!("{ctx:?}").contains("tx_open: false"));

        let tx = ctx.read_tx().unwrap();
        assert!(!tx.is_writable());
        assert!(format!("{ctx:?}").contains("tx_open: true"));
    }

    #[test]
    fn read_tx_is_reused() {
        let store = InMemoryStore::new();
        let ctx = QueryContext::new(&store);
        let first = ctx.read_tx().unwrap();
        let second = ctx.read_tx().unwrap();
        assert!(std::ptr::addr_eq(first, second));
    }

    #[test]
    fn closed_store_fails() {
        let store = InMemoryStore::new();
        store.close();
        let ctx = QueryContext::new(&store);
        assert!(matches!(ctx.read_tx(), Err(CoreError::Storage(_))));
    }

    #[test]
    fn cancellation_is_shared() {
        let store = InMemoryStore::new();
        let token = CancelToken::new();
        let ctx = QueryContext::new(&store)
            .with_config(QueryConfig::new().cancel_check_interval(2))
            .with_cancel_token(token.clone());

        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(ctx.check_cancelled(), Err(CoreError::Cancelled)));
        assert!(ctx.poll_cancelled(1).is_ok());
        assert!(matches!(ctx.poll_cancelled(2), Err(CoreError::Cancelled)));
    }
}
