//! Table schemas.

use keyscan_codec::FieldType;

use crate::error::{CoreError, CoreResult};
use crate::types::FieldId;

/// A field of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field id, unique within the schema.
    pub id: FieldId,
    /// Field name, unique within the schema.
    pub name: String,
    /// Declared type.
    pub ty: FieldType,
    /// Whether this field is the primary key.
    pub primary: bool,
}

/// The schema of a table.
///
/// # Invariants
///
/// - Field names and ids are unique
/// - Exactly one field is the primary key, and it has type `UInt64`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    primary: usize,
}

impl Schema {
    /// Starts building a schema for table `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by id.
    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Looks up a field by name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by name, failing with [`CoreError::UnknownField`].
    ///
    /// # Errors
    ///
    /// Returns an error if the schema has no such field.
    pub fn resolve(&self, name: &str) -> CoreResult<&Field> {
        self.field_by_name(name)
            .ok_or_else(|| CoreError::unknown_field(name))
    }

    /// Returns the primary key field.
    pub fn primary(&self) -> &Field {
        &self.fields[self.primary]
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Declares the `UInt64` primary key field.
    #[must_use]
    pub fn primary_key(self, name: impl Into<String>) -> Self {
        self.push(name.into(), FieldType::UInt64, true)
    }

    /// Declares a regular field.
    #[must_use]
    pub fn field(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.push(name.into(), ty, false)
    }

    fn push(mut self, name: String, ty: FieldType, primary: bool) -> Self {
        let id = FieldId::new(u16::try_from(self.fields.len()).unwrap_or(u16::MAX));
        self.fields.push(Field {
            id,
            name,
            ty,
            primary,
        });
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] on duplicate names, a missing or
    /// repeated primary key, or too many fields.
    pub fn build(self) -> CoreResult<Schema> {
        if self.fields.len() > usize::from(u16::MAX) {
            return Err(CoreError::invalid_schema("too many fields"));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(CoreError::invalid_schema("empty field name"));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CoreError::invalid_schema(format!(
                    "duplicate field {}",
                    field.name
                )));
            }
        }
        let mut primaries = self.fields.iter().enumerate().filter(|(_, f)| f.primary);
        let primary = match (primaries.next(), primaries.next()) {
            (Some((i, _)), None) => i,
            (None, _) => return Err(CoreError::invalid_schema("no primary key")),
            (Some(_), Some(_)) => return Err(CoreError::invalid_schema("multiple primary keys")),
        };
        Ok(Schema {
            name: self.name,
            fields: self.fields,
            primary,
        })
    }
}
