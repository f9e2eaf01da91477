//! Insert and stats binlog codec.

use crate::blob::Blob;
use crate::data::{FieldData, InsertData};
use crate::error::{CodecError, CodecResult};
use crate::format::{from_cbor, to_cbor, BinlogDescriptor, BinlogFile, LogKind};
use crate::schema::{CollectionMeta, CollectionSchema, DataType, UniqueId};
use crate::stats::PrimaryKeyStats;

/// Serializes insert batches into one blob per field, and primary-key
/// statistics into a single stats blob.
///
/// The codec is bound to one collection's metadata: every field of the
/// schema must be present in a batch, and no other field may be.
///
/// # Example
///
/// ```
/// use binlog_codec::{
///     CollectionMeta, CollectionSchema, FieldData, InsertCodec, InsertData,
///     ROW_ID_FIELD_ID, TIMESTAMP_FIELD_ID,
/// };
///
/// let meta = CollectionMeta::new(1, CollectionSchema::new("docs"));
/// let codec = InsertCodec::new(&meta);
///
/// let data = InsertData::new()
///     .with_field(ROW_ID_FIELD_ID, FieldData::Int64(vec![1, 2]))
///     .with_field(TIMESTAMP_FIELD_ID, FieldData::Int64(vec![10, 11]));
///
/// let blobs = codec.serialize(7, 8, &data).unwrap();
/// assert_eq!(blobs.len(), 2);
/// assert_eq!(blobs[0].key, "0");
///
/// let (partition, segment, decoded) = codec.deserialize(&blobs).unwrap();
/// assert_eq!((partition, segment), (7, 8));
/// assert_eq!(decoded, data);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct InsertCodec<'a> {
    meta: &'a CollectionMeta,
}

impl<'a> InsertCodec<'a> {
    /// Creates a codec for the given collection.
    #[must_use]
    pub fn new(meta: &'a CollectionMeta) -> Self {
        Self { meta }
    }

    /// Returns the collection id.
    #[must_use]
    pub fn collection_id(&self) -> UniqueId {
        self.meta.id
    }

    /// Returns the collection schema.
    #[must_use]
    pub fn schema(&self) -> &'a CollectionSchema {
        &self.meta.schema
    }

    /// Serializes a batch into one blob per schema field, in schema order.
    ///
    /// Each blob's key is the decimal field id.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch does not match the schema or its
    /// columns are not aligned.
    pub fn serialize(
        &self,
        partition_id: UniqueId,
        segment_id: UniqueId,
        data: &InsertData,
    ) -> CodecResult<Vec<Blob>> {
        let schema = self.schema();
        if let Some(unknown) = data.data.keys().find(|id| schema.field(**id).is_none()) {
            return Err(CodecError::schema_mismatch(format!(
                "field {unknown} is not part of collection {}",
                self.meta.id
            )));
        }

        let rows = data.row_count();
        let mut blobs = Vec::with_capacity(schema.fields.len());

        for field in &schema.fields {
            let column = data.field(field.field_id).ok_or_else(|| {
                CodecError::schema_mismatch(format!("missing data for field {}", field.field_id))
            })?;

            if column.data_type() != field.data_type {
                return Err(CodecError::schema_mismatch(format!(
                    "field {} expects {}, got {}",
                    field.field_id,
                    field.data_type,
                    column.data_type()
                )));
            }
            if let (FieldData::FloatVector { dim, .. }, Some(expected)) = (column, field.dim) {
                if *dim != expected {
                    return Err(CodecError::schema_mismatch(format!(
                        "field {} expects dimension {expected}, got {dim}",
                        field.field_id
                    )));
                }
            }
            if column.row_count() != rows {
                return Err(CodecError::RowCountMismatch {
                    field_id: field.field_id,
                    expected: rows,
                    actual: column.row_count(),
                });
            }

            let descriptor = BinlogDescriptor {
                collection_id: self.meta.id,
                partition_id,
                segment_id,
                field_id: field.field_id,
                data_type: Some(field.data_type),
                row_count: rows as u64,
            };
            let file = BinlogFile::new(LogKind::Insert, descriptor, to_cbor(column)?);
            blobs.push(Blob::new(
                field.field_id.to_string(),
                file.encode()?,
                rows as u64,
            ));
        }

        Ok(blobs)
    }

    /// Reassembles a batch from its field blobs.
    ///
    /// Returns `(partition_id, segment_id, data)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `blobs` is empty, a blob is not an insert log,
    /// or the blobs belong to different segments.
    pub fn deserialize(&self, blobs: &[Blob]) -> CodecResult<(UniqueId, UniqueId, InsertData)> {
        let mut owner: Option<(UniqueId, UniqueId)> = None;
        let mut data = InsertData::new();

        for blob in blobs {
            let file = BinlogFile::decode(&blob.value)?;
            file.expect_kind(LogKind::Insert)?;

            let d = &file.descriptor;
            match owner {
                None => owner = Some((d.partition_id, d.segment_id)),
                Some(ids) if ids != (d.partition_id, d.segment_id) => {
                    return Err(CodecError::decoding_failed(format!(
                        "blob for segment {} mixed with segment {}",
                        d.segment_id, ids.1
                    )));
                }
                Some(_) => {}
            }

            let column: FieldData = from_cbor(&file.body)?;
            data.data.insert(d.field_id, column);
        }

        let (partition_id, segment_id) =
            owner.ok_or_else(|| CodecError::decoding_failed("no blobs to deserialize"))?;
        Ok((partition_id, segment_id, data))
    }

    /// Serializes primary-key statistics into a single stats blob.
    ///
    /// The blob key is the primary key field id; its row count is
    /// `total_rows`, the number of rows the stats summarize.
    ///
    /// # Errors
    ///
    /// Returns an error if the stats field is not in the schema or the
    /// stats cannot be encoded.
    pub fn serialize_pk_stats(
        &self,
        stats: &PrimaryKeyStats,
        total_rows: u64,
    ) -> CodecResult<Blob> {
        let field = self.schema().field(stats.field_id).ok_or_else(|| {
            CodecError::schema_mismatch(format!(
                "stats field {} is not part of collection {}",
                stats.field_id, self.meta.id
            ))
        })?;

        let body =
            serde_json::to_vec(stats).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        let descriptor = BinlogDescriptor {
            collection_id: self.meta.id,
            partition_id: 0,
            segment_id: 0,
            field_id: field.field_id,
            data_type: Some(stats.pk_type),
            row_count: total_rows,
        };
        let file = BinlogFile::new(LogKind::Stats, descriptor, body);

        Ok(Blob::new(field.field_id.to_string(), file.encode()?, total_rows))
    }

    /// Decodes a stats blob back into statistics and the row count they cover.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not a valid stats log.
    pub fn deserialize_pk_stats(&self, blob: &Blob) -> CodecResult<(PrimaryKeyStats, u64)> {
        let file = BinlogFile::decode(&blob.value)?;
        file.expect_kind(LogKind::Stats)?;

        let stats: PrimaryKeyStats = serde_json::from_slice(&file.body)
            .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
        if file.descriptor.data_type != Some(stats.pk_type) {
            return Err(CodecError::decoding_failed(format!(
                "stats of type {} filed under descriptor type {:?}",
                stats.pk_type, file.descriptor.data_type
            )));
        }
        Ok((stats, file.descriptor.row_count))
    }
}
