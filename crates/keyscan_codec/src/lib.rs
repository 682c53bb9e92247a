//! # keyscan codec
//!
//! Typed value encoding for keyscan.
//!
//! Index keys are built by concatenating field encodings, so the encoding must
//! be **order-preserving**: for two values `a` and `b` of the same field type,
//! `a < b` iff `encode(a) < encode(b)` bytewise.
//!
//! ## Ordered Encoding Rules
//!
//! - Unsigned integers: big-endian at the type width
//! - Signed integers: big-endian at the type width with the sign bit flipped
//! - Floats: IEEE 754 bits, sign bit flipped for positives, all bits inverted
//!   for negatives; NaN is rejected and `-0.0` folds into `+0.0`
//! - Text and bytes: `0x00` escaped as `0x00 0xFF`, terminated by `0x00 0x01`,
//!   which keeps encodings prefix-free
//!
//! Rows use the compact little-endian layout instead; see [`EncodingConfig`].
//!
//! ## Usage
//!
//! ```
//! use keyscan_codec::{decode_value, encode_key, EncodingConfig, FieldType, Value};
//!
//! let cfg = EncodingConfig::ordered();
//! let low = encode_key(FieldType::Int32, &Value::Int(-5), &cfg).unwrap();
//! let high = encode_key(FieldType::Int32, &Value::Int(3), &cfg).unwrap();
//! assert!(low < high);
//!
//! let (value, _) = decode_value(&low, FieldType::Int32, &cfg).unwrap();
//! assert_eq!(value, Value::Int(-5));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{decode_value, FieldDecoder};
pub use encoder::{encode_key, encode_value, ByteOrder, EncodingConfig};
pub use error::{CodecError, CodecResult};
pub use value::{FieldType, Value};
