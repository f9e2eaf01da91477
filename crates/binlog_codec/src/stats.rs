//! Primary-key statistics over a segment.

use crate::data::{FieldData, PrimaryKey};
use crate::error::{CodecError, CodecResult};
use crate::schema::{DataType, FieldId};
use serde::{Deserialize, Serialize};

/// Min/max summary of the primary-key column of a segment.
///
/// Built upstream while rows are buffered and handed to the write path
/// read-only. Persisted as a stats binlog next to the insert binlogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyStats {
    /// Primary key field id.
    pub field_id: FieldId,
    /// Primary key type (`Int64` or `VarChar`).
    pub pk_type: DataType,
    /// Smallest key seen, `None` until a key is recorded.
    pub min: Option<PrimaryKey>,
    /// Largest key seen, `None` until a key is recorded.
    pub max: Option<PrimaryKey>,
}

impl PrimaryKeyStats {
    /// Creates empty stats for a primary key field.
    ///
    /// # Errors
    ///
    /// Returns an error if `pk_type` cannot be a primary key type.
    pub fn new(field_id: FieldId, pk_type: DataType) -> CodecResult<Self> {
        if !pk_type.is_primary_key_type() {
            return Err(CodecError::schema_mismatch(format!(
                "{pk_type} cannot be a primary key type"
            )));
        }
        Ok(Self {
            field_id,
            pk_type,
            min: None,
            max: None,
        })
    }

    /// Records one key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key type does not match the stats type.
    pub fn update(&mut self, pk: &PrimaryKey) -> CodecResult<()> {
        if pk.data_type() != self.pk_type {
            return Err(CodecError::schema_mismatch(format!(
                "primary key {pk} does not match stats type {}",
                self.pk_type
            )));
        }
        if self.min.as_ref().map_or(true, |min| pk < min) {
            self.min = Some(pk.clone());
        }
        if self.max.as_ref().map_or(true, |max| pk > max) {
            self.max = Some(pk.clone());
        }
        Ok(())
    }

    /// Records every key of a primary-key column.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is not of the stats type.
    pub fn update_from_column(&mut self, column: &FieldData) -> CodecResult<()> {
        if column.data_type() != self.pk_type {
            return Err(CodecError::schema_mismatch(format!(
                "column of type {} cannot feed {} primary key stats",
                column.data_type(),
                self.pk_type
            )));
        }
        for row in 0..column.row_count() {
            if let Some(pk) = column.primary_key(row) {
                self.update(&pk)?;
            }
        }
        Ok(())
    }

    /// Returns true if `pk` may be present in the segment.
    #[must_use]
    pub fn may_contain(&self, pk: &PrimaryKey) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => pk >= min && pk <= max,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_min_and_max() {
        let mut stats = PrimaryKeyStats::new(100, DataType::Int64).unwrap();
        stats
            .update_from_column(&FieldData::Int64(vec![5, -3, 42, 7]))
            .unwrap();

        assert_eq!(stats.min, Some(PrimaryKey::Int64(-3)));
        assert_eq!(stats.max, Some(PrimaryKey::Int64(42)));
        assert!(stats.may_contain(&PrimaryKey::Int64(0)));
        assert!(!stats.may_contain(&PrimaryKey::Int64(43)));
    }

    #[test]
    fn empty_stats_contain_nothing() {
        let stats = PrimaryKeyStats::new(100, DataType::VarChar).unwrap();
        assert!(!stats.may_contain(&PrimaryKey::VarChar("a".into())));
    }

    #[test]
    fn stats_reject_mismatched_types() {
        assert!(PrimaryKeyStats::new(100, DataType::Float).is_err());

        let mut stats = PrimaryKeyStats::new(100, DataType::Int64).unwrap();
        assert!(stats.update(&PrimaryKey::VarChar("x".into())).is_err());
        assert!(stats
            .update_from_column(&FieldData::Double(vec![1.0]))
            .is_err());
    }
}
