//! Typed field values and field types.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// A dynamically typed field value.
///
/// Values are loosely typed on their own. A [`FieldType`] narrows them with
/// [`FieldType::cast`] before they are encoded or compared against stored
/// rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// 64-bit float. Never NaN once cast to a field type.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns a short name for the value's variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Compares two values.
    ///
    /// Signed and unsigned integers compare by numeric value, floats compare
    /// with integers after widening. Text and bytes compare bytewise with each
    /// other. Returns `None` for incomparable kinds and NaN.
    #[allow(clippy::cast_precision_loss)]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::UInt(a), Value::UInt(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::UInt(a), Value::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::UInt(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::UInt(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.as_slice().cmp(b.as_slice())),
            (Value::Text(a), Value::Bytes(b)) => Some(a.as_bytes().cmp(b.as_slice())),
            (Value::Bytes(a), Value::Text(b)) => Some(a.as_slice().cmp(b.as_bytes())),
            _ => None,
        }
    }

    /// Returns the value as `u64` if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the text or byte content of the value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Text(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// The declared type of a table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 64-bit float.
    Float64,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

impl FieldType {
    /// Returns the type's name.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int8 => "int8",
            FieldType::Int16 => "int16",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt8 => "uint8",
            FieldType::UInt16 => "uint16",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::Float64 => "float64",
            FieldType::Text => "text",
            FieldType::Bytes => "bytes",
        }
    }

    /// Returns the encoded width for fixed-size types.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::Bool | FieldType::Int8 | FieldType::UInt8 => Some(1),
            FieldType::Int16 | FieldType::UInt16 => Some(2),
            FieldType::Int32 | FieldType::UInt32 => Some(4),
            FieldType::Int64 | FieldType::UInt64 | FieldType::Float64 => Some(8),
            FieldType::Text | FieldType::Bytes => None,
        }
    }

    /// Returns true for signed integer types.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            FieldType::Int8 | FieldType::Int16 | FieldType::Int32 | FieldType::Int64
        )
    }

    /// Returns true for unsigned integer types.
    pub const fn is_unsigned(self) -> bool {
        matches!(
            self,
            FieldType::UInt8 | FieldType::UInt16 | FieldType::UInt32 | FieldType::UInt64
        )
    }

    /// Returns true for text and byte types.
    pub const fn is_variable(self) -> bool {
        matches!(self, FieldType::Text | FieldType::Bytes)
    }

    fn signed_bounds(self) -> (i64, i64) {
        match self {
            FieldType::Int8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
            FieldType::Int16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
            FieldType::Int32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
            _ => (i64::MIN, i64::MAX),
        }
    }

    fn unsigned_max(self) -> u64 {
        match self {
            FieldType::UInt8 => u64::from(u8::MAX),
            FieldType::UInt16 => u64::from(u16::MAX),
            FieldType::UInt32 => u64::from(u32::MAX),
            _ => u64::MAX,
        }
    }

    /// Converts a value into the canonical variant for this type.
    ///
    /// Signed types produce [`Value::Int`], unsigned types [`Value::UInt`],
    /// `Float64` produces [`Value::Float`]. Integers are range checked
    /// against the type's width.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OutOfRange`] when an integer does not fit,
    /// [`CodecError::NaNForbidden`] for NaN floats and
    /// [`CodecError::TypeMismatch`] for incompatible variants.
    pub fn cast(self, value: &Value) -> CodecResult<Value> {
        match self {
            FieldType::Bool => match value {
                Value::Bool(v) => Ok(Value::Bool(*v)),
                other => Err(CodecError::type_mismatch(other.kind(), self)),
            },
            t if t.is_signed() => {
                let v = match value {
                    Value::Int(v) => *v,
                    Value::UInt(v) => {
                        i64::try_from(*v).map_err(|_| CodecError::out_of_range(v, self))?
                    }
                    other => return Err(CodecError::type_mismatch(other.kind(), self)),
                };
                let (min, max) = t.signed_bounds();
                if v < min || v > max {
                    return Err(CodecError::out_of_range(v, self));
                }
                Ok(Value::Int(v))
            }
            t if t.is_unsigned() => {
                let v = match value {
                    Value::UInt(v) => *v,
                    Value::Int(v) => {
                        u64::try_from(*v).map_err(|_| CodecError::out_of_range(v, self))?
                    }
                    other => return Err(CodecError::type_mismatch(other.kind(), self)),
                };
                if v > t.unsigned_max() {
                    return Err(CodecError::out_of_range(v, self));
                }
                Ok(Value::UInt(v))
            }
            FieldType::Float64 => {
                #[allow(clippy::cast_precision_loss)]
                let v = match value {
                    Value::Float(v) => *v,
                    Value::Int(v) => *v as f64,
                    Value::UInt(v) => *v as f64,
                    other => return Err(CodecError::type_mismatch(other.kind(), self)),
                };
                if v.is_nan() {
                    return Err(CodecError::NaNForbidden);
                }
                Ok(Value::Float(v))
            }
            FieldType::Text => match value {
                Value::Text(s) => Ok(Value::Text(s.clone())),
                Value::Bytes(b) => String::from_utf8(b.clone())
                    .map(Value::Text)
                    .map_err(|_| CodecError::InvalidUtf8),
                other => Err(CodecError::type_mismatch(other.kind(), self)),
            },
            FieldType::Bytes => match value {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                Value::Text(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
                other => Err(CodecError::type_mismatch(other.kind(), self)),
            },
            // unreachable: every integer type is covered by the guards above
            _ => Err(CodecError::type_mismatch(value.kind(), self)),
        }
    }

    /// Parses text into a value of this type.
    ///
    /// Bytes are given as hex, optionally prefixed with `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ParseFailed`] for malformed input, plus any
    /// error of [`FieldType::cast`].
    pub fn parse_value(self, input: &str) -> CodecResult<Value> {
        let trimmed = input.trim();
        let fail = || CodecError::parse_failed(input, self);
        let raw = match self {
            FieldType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" => Value::Bool(false),
                _ => return Err(fail()),
            },
            t if t.is_signed() => Value::Int(trimmed.parse::<i64>().map_err(|_| fail())?),
            t if t.is_unsigned() => Value::UInt(trimmed.parse::<u64>().map_err(|_| fail())?),
            FieldType::Float64 => Value::Float(trimmed.parse::<f64>().map_err(|_| fail())?),
            FieldType::Text => Value::Text(input.to_string()),
            FieldType::Bytes => {
                let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
                Value::Bytes(decode_hex(hex).ok_or_else(fail)?)
            }
            _ => return Err(fail()),
        };
        self.cast(&raw)
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bool" => FieldType::Bool,
            "int8" => FieldType::Int8,
            "int16" => FieldType::Int16,
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "uint8" => FieldType::UInt8,
            "uint16" => FieldType::UInt16,
            "uint32" => FieldType::UInt32,
            "uint64" => FieldType::UInt64,
            "float64" => FieldType::Float64,
            "text" => FieldType::Text,
            "bytes" => FieldType::Bytes,
            _ => return Err(CodecError::parse_failed(s, "field type")),
        })
    }
}
