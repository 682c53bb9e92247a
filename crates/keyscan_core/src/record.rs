//! Decoded rows and the stored row layout.
//!
//! Rows are stored in the table's data bucket keyed by the big-endian primary
//! key. The value holds every schema field in declaration order: one presence
//! byte, followed by the compact encoding when the field is present.

use keyscan_codec::{encode_value, EncodingConfig, FieldDecoder, Value};

use crate::error::{CoreError, CoreResult};
use crate::schema::Schema;
use crate::types::{FieldId, RowId};

const ABSENT: u8 = 0;
const PRESENT: u8 = 1;

/// Read access to the field values of one row.
pub trait RowSource {
    /// Returns the value of `field`, or `None` if the row does not carry it.
    fn value(&self, field: FieldId) -> Option<&Value>;
}

/// A decoded row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: Vec<(FieldId, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(field name, value)` pairs, casting every value
    /// to the field's declared type.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown field names or values that do not cast.
    pub fn from_named<'n, I>(schema: &Schema, pairs: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (&'n str, Value)>,
    {
        let mut record = Self::new();
        for (name, value) in pairs {
            let field = schema.resolve(name)?;
            record.set(field.id, field.ty.cast(&value)?);
        }
        Ok(record)
    }

    /// Sets a field value, replacing any previous value.
    pub fn set(&mut self, field: FieldId, value: Value) {
        match self.values.iter_mut().find(|(id, _)| *id == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with(mut self, field: FieldId, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Returns the value of a field.
    pub fn get(&self, field: FieldId) -> Option<&Value> {
        self.values
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, v)| v)
    }

    /// Returns the primary key, if present and a valid row id.
    pub fn row_id(&self, schema: &Schema) -> Option<RowId> {
        self.get(schema.primary().id).and_then(Value::as_u64)
    }

    /// Iterates `(field, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Value)> {
        self.values.iter().map(|(id, v)| (*id, v))
    }

    /// Number of fields carried.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the record carries no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl RowSource for Record {
    fn value(&self, field: FieldId) -> Option<&Value> {
        self.get(field)
    }
}

impl RowSource for std::collections::HashMap<FieldId, Value> {
    fn value(&self, field: FieldId) -> Option<&Value> {
        self.get(&field)
    }
}

/// Returns the data bucket key of a row.
pub(crate) fn row_key(row_id: RowId) -> [u8; 8] {
    row_id.to_be_bytes()
}

/// Encodes a record in the stored row layout.
pub(crate) fn encode_row(schema: &Schema, record: &Record) -> CoreResult<Vec<u8>> {
    let cfg = EncodingConfig::compact();
    let mut buf = Vec::new();
    for field in schema.fields() {
        match record.get(field.id) {
            Some(value) => {
                buf.push(PRESENT);
                encode_value(&mut buf, field.ty, value, &cfg)?;
            }
            None => buf.push(ABSENT),
        }
    }
    Ok(buf)
}

/// Decodes a stored row.
pub(crate) fn decode_row(schema: &Schema, bytes: &[u8]) -> CoreResult<Record> {
    let mut decoder = FieldDecoder::new(bytes, EncodingConfig::compact());
    let mut record = Record::new();
    for field in schema.fields() {
        let flag = decoder.decode(keyscan_codec::FieldType::Bool).map_err(|_| {
            CoreError::invalid_operation(format!("truncated row at field {}", field.name))
        })?;
        if flag == Value::Bool(true) {
            record.values.push((field.id, decoder.decode(field.ty)?));
        }
    }
    if !decoder.is_empty() {
        return Err(CoreError::invalid_operation(format!(
            "{} trailing bytes after row",
            decoder.remaining().len()
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscan_codec::FieldType;

    fn schema() -> Schema {
        Schema::builder("items")
            .primary_key("id")
            .field("price", FieldType::Float64)
            .field("tag", FieldType::Text)
            .build()
            .unwrap()
    }

    #[test]
    fn from_named_casts_values() {
        let schema = schema();
        let record = Record::from_named(
            &schema,
            [("id", Value::Int(7)), ("price", Value::Int(3))],
        )
        .unwrap();
        assert_eq!(record.get(FieldId::new(0)), Some(&Value::UInt(7)));
        assert_eq!(record.get(FieldId::new(1)), Some(&Value::Float(3.0)));
        assert_eq!(record.row_id(&schema), Some(7));
        assert_eq!(record.value(FieldId::new(2)), None);
    }

    #[test]
    fn from_named_rejects_unknown_field() {
        let err = Record::from_named(&schema(), [("color", Value::from("red"))]).unwrap_err();
        assert!(matches!(err, CoreError::UnknownField { .. }));
    }

    #[test]
    fn set_replaces_value() {
        let mut record = Record::new().with(FieldId::new(1), 1.5);
        record.set(FieldId::new(1), Value::Float(2.5));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(FieldId::new(1)), Some(&Value::Float(2.5)));
    }

    #[test]
    fn stored_layout_keeps_missing_fields_missing() {
        let schema = schema();
        let record = Record::new()
            .with(FieldId::new(0), 9u64)
            .with(FieldId::new(2), "a\0b");
        let bytes = encode_row(&schema, &record).unwrap();
        let decoded = decode_row(&schema, &bytes).unwrap();
        assert_eq!(decoded.get(FieldId::new(0)), Some(&Value::UInt(9)));
        assert_eq!(decoded.get(FieldId::new(1)), None);
        assert_eq!(decoded.get(FieldId::new(2)), Some(&Value::from("a\0b")));
    }

    #[test]
    fn truncated_row_fails() {
        let schema = schema();
        let record = Record::new().with(FieldId::new(0), 9u64);
        let bytes = encode_row(&schema, &record).unwrap();
        assert!(decode_row(&schema, &bytes[..bytes.len() - 1]).is_err());

        let mut extra = bytes;
        extra.push(0);
        assert!(decode_row(&schema, &extra).is_err());
    }

    #[test]
    fn row_keys_sort_by_id() {
        assert!(row_key(2) < row_key(256));
        assert_eq!(row_key(1), [0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
