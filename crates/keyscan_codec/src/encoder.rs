//! Typed value encoder.
//!
//! Two layouts are supported, selected by [`EncodingConfig`]:
//!
//! - **Ordered** (big-endian): bytewise comparison of encodings matches the
//!   comparison of the values. Used for every index key.
//! - **Compact** (little-endian): length-prefixed, not order-preserving.
//!   Used for stored rows.

use crate::error::{CodecError, CodecResult};
use crate::value::{FieldType, Value};

/// Escape byte inside ordered text and bytes.
pub(crate) const ESCAPE: u8 = 0x00;
/// Follows [`ESCAPE`] to encode a literal zero byte.
pub(crate) const ESCAPED_ZERO: u8 = 0xFF;
/// Follows [`ESCAPE`] to terminate a value.
pub(crate) const TERMINATOR: u8 = 0x01;

const SIGN_BIT: u64 = 1 << 63;

/// Byte order of fixed-width encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first. Order-preserving.
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

/// Selects the encoding layout.
///
/// The encoder never picks a byte order implicitly; callers state it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingConfig {
    /// Byte order for fixed-width values.
    pub byte_order: ByteOrder,
}

impl EncodingConfig {
    /// The order-preserving layout used for index keys.
    #[must_use]
    pub const fn ordered() -> Self {
        Self {
            byte_order: ByteOrder::BigEndian,
        }
    }

    /// The compact layout used for stored rows.
    #[must_use]
    pub const fn compact() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
        }
    }

    /// Returns true if bytewise order of encodings follows value order.
    pub const fn is_order_preserving(&self) -> bool {
        matches!(self.byte_order, ByteOrder::BigEndian)
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self::ordered()
    }
}

/// Appends the encoding of `value` as `ty` to `buf`.
///
/// The value is first cast to `ty`, so an `Int` literal can be encoded into
/// an unsigned field as long as it fits.
///
/// # Errors
///
/// Returns an error if the value cannot be cast to `ty` (out of range, NaN,
/// wrong kind).
pub fn encode_value(
    buf: &mut Vec<u8>,
    ty: FieldType,
    value: &Value,
    cfg: &EncodingConfig,
) -> CodecResult<()> {
    let width = ty.fixed_width();
    match (ty.cast(value)?, width) {
        (Value::Bool(v), _) => buf.push(u8::from(v)),
        (Value::Int(v), Some(width)) => {
            #[allow(clippy::cast_sign_loss)]
            let mut raw = v as u64;
            if cfg.is_order_preserving() {
                raw ^= 1u64 << (width * 8 - 1);
            }
            put_fixed(buf, raw, width, cfg);
        }
        (Value::UInt(v), Some(width)) => put_fixed(buf, v, width, cfg),
        (Value::Float(v), _) => {
            // -0.0 and +0.0 compare equal and must share one encoding.
            let v = if v == 0.0 { 0.0 } else { v };
            let mut raw = v.to_bits();
            if cfg.is_order_preserving() {
                raw = if raw & SIGN_BIT != 0 {
                    !raw
                } else {
                    raw ^ SIGN_BIT
                };
            }
            put_fixed(buf, raw, 8, cfg);
        }
        (Value::Text(s), _) => put_variable(buf, s.as_bytes(), cfg)?,
        (Value::Bytes(b), _) => put_variable(buf, &b, cfg)?,
        (other, _) => {
            return Err(CodecError::encoding_failed(format!(
                "{} value for {ty}",
                other.kind()
            )))
        }
    }
    Ok(())
}

/// Encodes a single value into a fresh buffer.
///
/// # Errors
///
/// See [`encode_value`].
pub fn encode_key(ty: FieldType, value: &Value, cfg: &EncodingConfig) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(ty.fixed_width().unwrap_or(16));
    encode_value(&mut buf, ty, value, cfg)?;
    Ok(buf)
}

fn put_fixed(buf: &mut Vec<u8>, raw: u64, width: usize, cfg: &EncodingConfig) {
    match cfg.byte_order {
        ByteOrder::BigEndian => buf.extend_from_slice(&raw.to_be_bytes()[8 - width..]),
        ByteOrder::LittleEndian => buf.extend_from_slice(&raw.to_le_bytes()[..width]),
    }
}

fn put_variable(buf: &mut Vec<u8>, bytes: &[u8], cfg: &EncodingConfig) -> CodecResult<()> {
    if cfg.is_order_preserving() {
        buf.reserve(bytes.len() + 2);
        for &b in bytes {
            buf.push(b);
            if b == ESCAPE {
                buf.push(ESCAPED_ZERO);
            }
        }
        buf.push(ESCAPE);
        buf.push(TERMINATOR);
    } else {
        let len = u32::try_from(bytes.len())
            .map_err(|_| CodecError::encoding_failed("value longer than u32::MAX bytes"))?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(bytes);
    }
    Ok(())
}
