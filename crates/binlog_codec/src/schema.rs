//! Collection schema and metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique identifier handed out by the id allocator.
///
/// Collections, partitions, segments and log ids all share this space.
pub type UniqueId = i64;

/// Identifier of a field within a collection schema.
pub type FieldId = i64;

/// Field id of the system row-id column.
pub const ROW_ID_FIELD_ID: FieldId = 0;

/// Field id of the system timestamp column.
pub const TIMESTAMP_FIELD_ID: FieldId = 1;

/// First field id available to user-defined fields.
pub const START_OF_USER_FIELD_ID: FieldId = 100;

/// Element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean values.
    Bool,
    /// 8-bit signed integers.
    Int8,
    /// 16-bit signed integers.
    Int16,
    /// 32-bit signed integers.
    Int32,
    /// 64-bit signed integers.
    Int64,
    /// 32-bit floats.
    Float,
    /// 64-bit floats.
    Double,
    /// Variable-length UTF-8 strings.
    VarChar,
    /// Fixed-dimension float vectors.
    FloatVector,
}

impl DataType {
    /// Returns true if a primary key may have this type.
    #[must_use]
    pub const fn is_primary_key_type(self) -> bool {
        matches!(self, DataType::Int64 | DataType::VarChar)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Definition of one field in a collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field identifier, unique within the collection.
    pub field_id: FieldId,
    /// Field name.
    pub name: String,
    /// Column element type.
    pub data_type: DataType,
    /// Whether this field is the primary key.
    pub is_primary_key: bool,
    /// Vector dimension for vector fields.
    pub dim: Option<usize>,
}

impl FieldSchema {
    /// Creates a scalar field.
    pub fn new(field_id: FieldId, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field_id,
            name: name.into(),
            data_type,
            is_primary_key: false,
            dim: None,
        }
    }

    /// Creates a float vector field of the given dimension.
    pub fn float_vector(field_id: FieldId, name: impl Into<String>, dim: usize) -> Self {
        Self {
            dim: Some(dim),
            ..Self::new(field_id, name, DataType::FloatVector)
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

/// Schema of a collection: an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSchema>,
}

impl CollectionSchema {
    /// Creates a schema with the two system fields (row id, timestamp).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![
                FieldSchema::new(ROW_ID_FIELD_ID, "RowID", DataType::Int64),
                FieldSchema::new(TIMESTAMP_FIELD_ID, "Timestamp", DataType::Int64),
            ],
        }
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Looks up a field by id.
    #[must_use]
    pub fn field(&self, field_id: FieldId) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    /// Returns the primary key field, if the schema declares one.
    #[must_use]
    pub fn primary_key_field(&self) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.is_primary_key)
    }
}

/// Collection metadata handed to the write path: identifier plus schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMeta {
    /// Collection identifier, stamped into every binlog key.
    pub id: UniqueId,
    /// Collection schema.
    pub schema: CollectionSchema,
}

impl CollectionMeta {
    /// Creates collection metadata.
    pub fn new(id: UniqueId, schema: CollectionSchema) -> Self {
        Self { id, schema }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_schema_has_system_fields() {
        let schema = CollectionSchema::new("docs");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.field(ROW_ID_FIELD_ID).unwrap().name, "RowID");
        assert_eq!(schema.field(TIMESTAMP_FIELD_ID).unwrap().name, "Timestamp");
        assert!(schema.primary_key_field().is_none());
    }

    #[test]
    fn primary_key_lookup() {
        let schema = CollectionSchema::new("docs")
            .with_field(FieldSchema::new(100, "pk", DataType::Int64).primary_key())
            .with_field(FieldSchema::float_vector(101, "vec", 4));

        let pk = schema.primary_key_field().unwrap();
        assert_eq!(pk.field_id, 100);
        assert_eq!(schema.field(101).unwrap().dim, Some(4));
        assert!(schema.field(999).is_none());
    }

    #[test]
    fn primary_key_types() {
        assert!(DataType::Int64.is_primary_key_type());
        assert!(DataType::VarChar.is_primary_key_type());
        assert!(!DataType::Float.is_primary_key_type());
    }
}
