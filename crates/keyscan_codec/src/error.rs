//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding, decoding or casting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value cannot be encoded for the requested field type.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Bytes cannot be decoded into the requested field type.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// NaN has no position in the total key order.
    #[error("NaN values are forbidden")]
    NaNForbidden,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Value does not fit into the field type.
    #[error("value {value} out of range for {field_type}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Target field type.
        field_type: String,
    },

    /// Value variant is incompatible with the field type.
    #[error("cannot convert {from} to {to}")]
    TypeMismatch {
        /// Source value kind.
        from: String,
        /// Target field type.
        to: String,
    },

    /// Text could not be parsed as a value of the field type.
    #[error("cannot parse {input:?} as {field_type}")]
    ParseFailed {
        /// The rejected input.
        input: String,
        /// Target field type.
        field_type: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(value: impl ToString, field_type: impl ToString) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            field_type: field_type.to_string(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(from: impl Into<String>, to: impl ToString) -> Self {
        Self::TypeMismatch {
            from: from.into(),
            to: to.to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse_failed(input: impl Into<String>, field_type: impl ToString) -> Self {
        Self::ParseFailed {
            input: input.into(),
            field_type: field_type.to_string(),
        }
    }
}
