//! Typed value decoder.

use crate::encoder::{ByteOrder, EncodingConfig, ESCAPE, ESCAPED_ZERO, TERMINATOR};
use crate::error::{CodecError, CodecResult};
use crate::value::{FieldType, Value};

const SIGN_BIT: u64 = 1 << 63;

/// Decodes one value of type `ty` from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// Returns an error on truncated input, malformed escapes or invalid UTF-8.
pub fn decode_value(
    bytes: &[u8],
    ty: FieldType,
    cfg: &EncodingConfig,
) -> CodecResult<(Value, usize)> {
    let mut decoder = FieldDecoder::new(bytes, *cfg);
    let value = decoder.decode(ty)?;
    Ok((value, decoder.position()))
}

/// A sequential decoder over a buffer of concatenated field encodings.
pub struct FieldDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    cfg: EncodingConfig,
}

impl<'a> FieldDecoder<'a> {
    /// Create a decoder over `data`.
    pub fn new(data: &'a [u8], cfg: EncodingConfig) -> Self {
        Self { data, pos: 0, cfg }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns true when every byte was consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        let data: &'a [u8] = self.data;
        &data[self.pos.min(data.len())..]
    }

    /// Decodes the next value as `ty`.
    ///
    /// # Errors
    ///
    /// Returns an error on truncated or malformed input.
    pub fn decode(&mut self, ty: FieldType) -> CodecResult<Value> {
        match ty {
            FieldType::Bool => match self.read_bytes(1)?[0] {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                b => Err(CodecError::decoding_failed(format!("invalid bool byte {b:#04x}"))),
            },
            FieldType::Float64 => {
                let mut raw = self.read_fixed(8)?;
                if self.cfg.is_order_preserving() {
                    raw = if raw & SIGN_BIT != 0 {
                        raw ^ SIGN_BIT
                    } else {
                        !raw
                    };
                }
                Ok(Value::Float(f64::from_bits(raw)))
            }
            FieldType::Text => {
                let bytes = self.read_variable()?;
                String::from_utf8(bytes)
                    .map(Value::Text)
                    .map_err(|_| CodecError::InvalidUtf8)
            }
            FieldType::Bytes => Ok(Value::Bytes(self.read_variable()?)),
            t => {
                let width = t
                    .fixed_width()
                    .ok_or_else(|| CodecError::decoding_failed(format!("no width for {t}")))?;
                let raw = self.read_fixed(width)?;
                if t.is_signed() {
                    let shift = 64 - width * 8;
                    let mut raw = raw;
                    if self.cfg.is_order_preserving() {
                        raw ^= 1u64 << (width * 8 - 1);
                    }
                    // Sign-extend from the type width.
                    #[allow(clippy::cast_possible_wrap)]
                    let v = ((raw << shift) as i64) >> shift;
                    Ok(Value::Int(v))
                } else {
                    Ok(Value::UInt(raw))
                }
            }
        }
    }

    fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(CodecError::UnexpectedEof)?;
        let data: &'a [u8] = self.data;
        let slice = data.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_fixed(&mut self, width: usize) -> CodecResult<u64> {
        let bytes = self.read_bytes(width)?;
        let mut buf = [0u8; 8];
        Ok(match self.cfg.byte_order {
            ByteOrder::BigEndian => {
                buf[8 - width..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
            ByteOrder::LittleEndian => {
                buf[..width].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
        })
    }

    fn read_variable(&mut self) -> CodecResult<Vec<u8>> {
        if !self.cfg.is_order_preserving() {
            let len_bytes = self.read_bytes(4)?;
            let mut len = [0u8; 4];
            len.copy_from_slice(len_bytes);
            let len = u32::from_le_bytes(len) as usize;
            return Ok(self.read_bytes(len)?.to_vec());
        }

        let mut out = Vec::new();
        loop {
            let b = self.read_bytes(1)?[0];
            if b != ESCAPE {
                out.push(b);
                continue;
            }
            match self.read_bytes(1)?[0] {
                ESCAPED_ZERO => out.push(ESCAPE),
                TERMINATOR => return Ok(out),
                other => {
                    return Err(CodecError::decoding_failed(format!(
                        "invalid escape sequence 0x00 {other:#04x}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_key, encode_value};

    fn both() -> [EncodingConfig; 2] {
        [EncodingConfig::ordered(), EncodingConfig::compact()]
    }

    #[test]
    fn decode_each_type() {
        let cases = [
            (FieldType::Bool, Value::Bool(true)),
            (FieldType::Int8, Value::Int(-128)),
            (FieldType::Int16, Value::Int(-2)),
            (FieldType::Int32, Value::Int(123_456)),
            (FieldType::Int64, Value::Int(i64::MIN)),
            (FieldType::UInt8, Value::UInt(255)),
            (FieldType::UInt32, Value::UInt(7)),
            (FieldType::UInt64, Value::UInt(u64::MAX)),
            (FieldType::Float64, Value::Float(-1.5)),
            (FieldType::Text, Value::from("a\0b")),
            (FieldType::Bytes, Value::Bytes(vec![0, 0, 255])),
        ];
        for cfg in both() {
            for (ty, value) in &cases {
                let bytes = encode_key(*ty, value, &cfg).unwrap();
                let (decoded, used) = decode_value(&bytes, *ty, &cfg).unwrap();
                assert_eq!(&decoded, value, "{ty} {cfg:?}");
                assert_eq!(used, bytes.len());
            }
        }
    }

    #[test]
    fn sequential_fields() {
        let cfg = EncodingConfig::ordered();
        let mut buf = Vec::new();
        encode_value(&mut buf, FieldType::Text, &Value::from("k"), &cfg).unwrap();
        encode_value(&mut buf, FieldType::Int32, &Value::Int(-9), &cfg).unwrap();
        buf.extend_from_slice(&42u64.to_be_bytes());

        let mut decoder = FieldDecoder::new(&buf, cfg);
        assert_eq!(decoder.decode(FieldType::Text).unwrap(), Value::from("k"));
        assert_eq!(decoder.decode(FieldType::Int32).unwrap(), Value::Int(-9));
        assert_eq!(decoder.remaining(), &42u64.to_be_bytes());
        assert_eq!(decoder.decode(FieldType::UInt64).unwrap(), Value::UInt(42));
        assert!(decoder.is_empty());
    }

    #[test]
    fn truncated_input() {
        let cfg = EncodingConfig::ordered();
        assert_eq!(
            decode_value(&[0, 1], FieldType::UInt32, &cfg),
            Err(CodecError::UnexpectedEof)
        );
        assert_eq!(
            decode_value(b"abc", FieldType::Text, &cfg),
            Err(CodecError::UnexpectedEof)
        );
    }

    #[test]
    fn malformed_escape() {
        let err = decode_value(&[b'a', 0x00, 0x05], FieldType::Bytes, &EncodingConfig::ordered())
            .unwrap_err();
        assert!(matches!(err, CodecError::DecodingFailed { .. }));
    }

    #[test]
    fn invalid_utf8() {
        assert_eq!(
            decode_value(&[0xC3, 0x00, 0x01], FieldType::Text, &EncodingConfig::ordered()),
            Err(CodecError::InvalidUtf8)
        );
    }
}
