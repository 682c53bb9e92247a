//! Ordered store, transaction and cursor traits.

use crate::error::StorageResult;

/// Selects what a cursor materialises while iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorKind {
    /// Keys and values are visible.
    Forward,
    /// Only keys are visible; [`Cursor::value`] returns an empty slice.
    ///
    /// Index scans use this kind since index keys carry all information.
    KeysOnly,
}

/// A positioned iterator over the keys of one bucket.
///
/// # Invariants
///
/// - Iteration is strictly ascending by key bytes
/// - A cursor opened with a prefix never yields a key outside that prefix
/// - `key` and `value` are only meaningful after a positioning call returned
///   `true`
///
/// Cursors are released on drop.
pub trait Cursor {
    /// Positions the cursor at the first key. Returns `false` when empty.
    fn first(&mut self) -> bool;

    /// Advances to the next key. Returns `false` when exhausted.
    fn next(&mut self) -> bool;

    /// Positions the cursor at the first key `>= key`.
    ///
    /// Returns `false` when no such key exists.
    fn seek(&mut self, key: &[u8]) -> bool;

    /// Returns the key at the current position.
    fn key(&self) -> &[u8];

    /// Returns the value at the current position.
    fn value(&self) -> &[u8];

    /// Returns true if the cursor is positioned on a key.
    fn is_valid(&self) -> bool;
}

/// A storage transaction.
///
/// Read transactions observe a snapshot taken when they began. Write
/// transactions buffer their changes and publish them atomically on
/// [`StorageTx::commit`].
pub trait StorageTx {
    /// Returns true if this transaction may modify the store.
    fn is_writable(&self) -> bool;

    /// Creates a bucket if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadOnly`] on read transactions.
    fn create_bucket(&mut self, bucket: &[u8]) -> StorageResult<()>;

    /// Removes a bucket and all of its keys.
    ///
    /// # Errors
    ///
    /// Returns an error on read transactions or when the bucket is missing.
    fn delete_bucket(&mut self, bucket: &[u8]) -> StorageResult<()>;

    /// Returns true if the bucket exists.
    fn has_bucket(&self, bucket: &[u8]) -> bool;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error on read transactions or when the bucket is missing.
    fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the bucket is missing.
    fn get(&self, bucket: &[u8], key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Removes `key`. Returns whether the key existed.
    ///
    /// # Errors
    ///
    /// Returns an error on read transactions or when the bucket is missing.
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> StorageResult<bool>;

    /// Returns the number of keys in a bucket.
    ///
    /// # Errors
    ///
    /// Returns an error when the bucket is missing.
    fn len(&self, bucket: &[u8]) -> StorageResult<usize>;

    /// Opens a cursor restricted to keys that start with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error when the bucket is missing.
    fn range<'a>(
        &'a self,
        bucket: &[u8],
        prefix: &[u8],
        kind: CursorKind,
    ) -> StorageResult<Box<dyn Cursor + 'a>>;

    /// Opens an unrestricted cursor over the whole bucket.
    ///
    /// # Errors
    ///
    /// Returns an error when the bucket is missing.
    fn cursor<'a>(&'a self, bucket: &[u8], kind: CursorKind)
        -> StorageResult<Box<dyn Cursor + 'a>>;

    /// Publishes all changes made by this transaction.
    ///
    /// Committing a read transaction is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store was closed in the meantime.
    fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards all changes made by this transaction.
    fn rollback(self: Box<Self>);
}

/// An ordered key-value store.
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For tests and ephemeral storage
pub trait KvStore: Send + Sync {
    /// Begins a transaction.
    ///
    /// Only one write transaction may be open at a time; further writers
    /// block until it finishes. Readers never block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Closed`] if the store is closed.
    fn begin(&self, writable: bool) -> StorageResult<Box<dyn StorageTx + '_>>;

    /// Closes the store. Subsequent transactions fail.
    fn close(&self);

    /// Returns true once [`KvStore::close`] was called.
    fn is_closed(&self) -> bool;
}
