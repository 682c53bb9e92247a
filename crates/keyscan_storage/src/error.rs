//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The named bucket does not exist.
    #[error("bucket not found: {name}")]
    BucketNotFound {
        /// Lossy UTF-8 rendering of the bucket name.
        name: String,
    },

    /// A write was attempted through a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnly,

    /// The store is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The store is closed.
    #[error("storage is closed")]
    Closed,
}

impl StorageError {
    /// Creates a bucket-not-found error.
    pub fn bucket_not_found(name: &[u8]) -> Self {
        Self::BucketNotFound {
            name: String::from_utf8_lossy(name).into_owned(),
        }
    }
}
