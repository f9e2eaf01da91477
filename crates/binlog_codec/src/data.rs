//! In-memory row batches.
//!
//! [`InsertData`] is column oriented: one [`FieldData`] column per field,
//! every column holding the same number of rows. [`DeleteData`] is a list of
//! primary keys with the timestamps at which they were deleted.

use crate::schema::{DataType, FieldId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One column of an insert batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldData {
    /// Boolean column.
    Bool(Vec<bool>),
    /// 8-bit integer column.
    Int8(Vec<i8>),
    /// 16-bit integer column.
    Int16(Vec<i16>),
    /// 32-bit integer column.
    Int32(Vec<i32>),
    /// 64-bit integer column.
    Int64(Vec<i64>),
    /// 32-bit float column.
    Float(Vec<f32>),
    /// 64-bit float column.
    Double(Vec<f64>),
    /// String column.
    VarChar(Vec<String>),
    /// Float vector column, `dim` floats per row, rows stored back to back.
    FloatVector {
        /// Vector dimension.
        dim: usize,
        /// Flattened vector data.
        data: Vec<f32>,
    },
}

impl FieldData {
    /// Returns the number of rows in this column.
    #[must_use]
    pub fn row_count(&self) -> usize {
        match self {
            FieldData::Bool(v) => v.len(),
            FieldData::Int8(v) => v.len(),
            FieldData::Int16(v) => v.len(),
            FieldData::Int32(v) => v.len(),
            FieldData::Int64(v) => v.len(),
            FieldData::Float(v) => v.len(),
            FieldData::Double(v) => v.len(),
            FieldData::VarChar(v) => v.len(),
            FieldData::FloatVector { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
        }
    }

    /// Returns true if the column holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns the element type of this column.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            FieldData::Bool(_) => DataType::Bool,
            FieldData::Int8(_) => DataType::Int8,
            FieldData::Int16(_) => DataType::Int16,
            FieldData::Int32(_) => DataType::Int32,
            FieldData::Int64(_) => DataType::Int64,
            FieldData::Float(_) => DataType::Float,
            FieldData::Double(_) => DataType::Double,
            FieldData::VarChar(_) => DataType::VarChar,
            FieldData::FloatVector { .. } => DataType::FloatVector,
        }
    }

    /// Returns the primary key stored at `row`, for primary-key typed columns.
    #[must_use]
    pub fn primary_key(&self, row: usize) -> Option<PrimaryKey> {
        match self {
            FieldData::Int64(v) => v.get(row).copied().map(PrimaryKey::Int64),
            FieldData::VarChar(v) => v.get(row).cloned().map(PrimaryKey::VarChar),
            _ => None,
        }
    }
}

/// A batch of inserted rows, one column per field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsertData {
    /// Columns keyed by field id.
    pub data: BTreeMap<FieldId, FieldData>,
}

impl InsertData {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the column for `field_id`.
    #[must_use]
    pub fn with_field(mut self, field_id: FieldId, column: FieldData) -> Self {
        self.data.insert(field_id, column);
        self
    }

    /// Returns the column for `field_id`.
    #[must_use]
    pub fn field(&self, field_id: FieldId) -> Option<&FieldData> {
        self.data.get(&field_id)
    }

    /// Returns true if every column is empty (or there are no columns).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.values().all(FieldData::is_empty)
    }

    /// Returns the number of rows in the batch.
    ///
    /// Columns are expected to be aligned; the longest one is reported.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data
            .values()
            .map(FieldData::row_count)
            .max()
            .unwrap_or(0)
    }
}

/// A primary key value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimaryKey {
    /// Integer primary key.
    Int64(i64),
    /// String primary key.
    VarChar(String),
}

impl PrimaryKey {
    /// Returns the data type of this key.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            PrimaryKey::Int64(_) => DataType::Int64,
            PrimaryKey::VarChar(_) => DataType::VarChar,
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int64(v) => write!(f, "{v}"),
            PrimaryKey::VarChar(v) => write!(f, "{v:?}"),
        }
    }
}

/// A batch of deletions: primary keys and their delete timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteData {
    /// Deleted primary keys.
    pub pks: Vec<PrimaryKey>,
    /// Delete timestamps, aligned with `pks`.
    pub tss: Vec<u64>,
    /// Number of deletions in the batch.
    pub row_count: u64,
}

impl DeleteData {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one deletion.
    pub fn append(&mut self, pk: PrimaryKey, ts: u64) {
        self.pks.push(pk);
        self.tss.push(ts);
        self.row_count += 1;
    }

    /// Returns true if the batch holds no deletions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_data_row_counts() {
        assert_eq!(FieldData::Int64(vec![1, 2, 3]).row_count(), 3);
        assert_eq!(
            FieldData::VarChar(vec!["a".into(), "b".into()]).row_count(),
            2
        );
        let vectors = FieldData::FloatVector {
            dim: 2,
            data: vec![0.1, 0.2, 0.3, 0.4],
        };
        assert_eq!(vectors.row_count(), 2);
        assert_eq!(vectors.data_type(), DataType::FloatVector);

        let degenerate = FieldData::FloatVector {
            dim: 0,
            data: vec![1.0],
        };
        assert_eq!(degenerate.row_count(), 0);
    }

    #[test]
    fn insert_data_emptiness() {
        assert!(InsertData::new().is_empty());

        let empty_columns = InsertData::new()
            .with_field(0, FieldData::Int64(vec![]))
            .with_field(1, FieldData::Int64(vec![]));
        assert!(empty_columns.is_empty());
        assert_eq!(empty_columns.row_count(), 0);

        let rows = InsertData::new().with_field(0, FieldData::Int64(vec![7]));
        assert!(!rows.is_empty());
        assert_eq!(rows.row_count(), 1);
    }

    #[test]
    fn primary_key_extraction() {
        let ints = FieldData::Int64(vec![10, 20]);
        assert_eq!(ints.primary_key(1), Some(PrimaryKey::Int64(20)));
        assert_eq!(ints.primary_key(2), None);

        let floats = FieldData::Float(vec![1.0]);
        assert_eq!(floats.primary_key(0), None);
    }

    #[test]
    fn delete_data_append() {
        let mut deletes = DeleteData::new();
        assert!(deletes.is_empty());

        deletes.append(PrimaryKey::Int64(1), 100);
        deletes.append(PrimaryKey::Int64(2), 101);
        assert_eq!(deletes.row_count, 2);
        assert_eq!(deletes.tss, vec![100, 101]);
        assert!(!deletes.is_empty());
    }
}
