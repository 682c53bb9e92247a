//! Error types for keyscan core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while compiling conditions, scanning indexes or
/// executing queries.
///
/// "Index not applicable" is never an error; compilers return `Ok(None)`
/// for it.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] keyscan_storage::StorageError),

    /// Value encoding, decoding or casting error.
    #[error("codec error: {0}")]
    Codec(#[from] keyscan_codec::CodecError),

    /// A predicate node has the wrong shape for the operation, or a
    /// condition could not be compiled.
    #[error("invalid condition: {message}")]
    InvalidCondition {
        /// Description of the problem.
        message: String,
    },

    /// A condition or index references a field the schema does not have.
    #[error("unknown field: {name}")]
    UnknownField {
        /// Name of the field.
        name: String,
    },

    /// Schema definition is invalid.
    #[error("invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },

    /// An index key is too short to carry a row id.
    #[error("corrupt key in index {index}: {len} bytes")]
    CorruptIndexKey {
        /// Index name.
        index: String,
        /// Length of the offending key.
        len: usize,
    },

    /// A row already exists under this primary key.
    #[error("duplicate row id {row_id}")]
    DuplicateRow {
        /// The conflicting primary key.
        row_id: u64,
    },

    /// No row exists under this primary key.
    #[error("row {row_id} not found")]
    RowNotFound {
        /// The missing primary key.
        row_id: u64,
    },

    /// The query was cancelled.
    #[error("query cancelled")]
    Cancelled,

    /// Invalid operation.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid condition error.
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
