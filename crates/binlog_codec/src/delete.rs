//! Delete (delta) binlog codec.

use crate::blob::Blob;
use crate::data::{DeleteData, PrimaryKey};
use crate::error::{CodecError, CodecResult};
use crate::format::{from_cbor, to_cbor, BinlogDescriptor, BinlogFile, LogKind};
use crate::schema::UniqueId;
use serde::{Deserialize, Serialize};

/// Field id recorded for delete logs, which are not tied to a field.
pub const DELETE_FIELD_ID: i64 = 0;

#[derive(Serialize, Deserialize)]
struct DeletePayload {
    pks: Vec<PrimaryKey>,
    tss: Vec<u64>,
}

/// Serializes delete batches into a single delta blob per segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteCodec;

impl DeleteCodec {
    /// Creates a delete codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Serializes a delete batch.
    ///
    /// The returned blob has an empty key; its row count is the number of
    /// deletions.
    ///
    /// # Errors
    ///
    /// Returns an error if keys, timestamps and row count disagree.
    pub fn serialize(
        &self,
        collection_id: UniqueId,
        partition_id: UniqueId,
        segment_id: UniqueId,
        data: &DeleteData,
    ) -> CodecResult<Blob> {
        if data.pks.len() != data.tss.len() || data.pks.len() as u64 != data.row_count {
            return Err(CodecError::encoding_failed(format!(
                "delete batch has {} keys, {} timestamps and row count {}",
                data.pks.len(),
                data.tss.len(),
                data.row_count
            )));
        }

        let descriptor = BinlogDescriptor {
            collection_id,
            partition_id,
            segment_id,
            field_id: DELETE_FIELD_ID,
            data_type: None,
            row_count: data.row_count,
        };
        let payload = DeletePayload {
            pks: data.pks.clone(),
            tss: data.tss.clone(),
        };
        let file = BinlogFile::new(LogKind::Delete, descriptor, to_cbor(&payload)?);

        Ok(Blob::new(String::new(), file.encode()?, data.row_count))
    }

    /// Decodes a delta blob.
    ///
    /// Returns `(partition_id, segment_id, data)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not a valid delete log.
    pub fn deserialize(&self, blob: &Blob) -> CodecResult<(UniqueId, UniqueId, DeleteData)> {
        let file = BinlogFile::decode(&blob.value)?;
        file.expect_kind(LogKind::Delete)?;

        let payload: DeletePayload = from_cbor(&file.body)?;
        if payload.pks.len() != payload.tss.len() {
            return Err(CodecError::decoding_failed(
                "delete log keys and timestamps are not aligned",
            ));
        }
        let row_count = payload.pks.len() as u64;
        let data = DeleteData {
            pks: payload.pks,
            tss: payload.tss,
            row_count,
        };

        Ok((file.descriptor.partition_id, file.descriptor.segment_id, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_roundtrip() {
        let mut data = DeleteData::new();
        data.append(PrimaryKey::Int64(1), 100);
        data.append(PrimaryKey::VarChar("doc-9".into()), 200);

        let blob = DeleteCodec::new().serialize(1, 2, 3, &data).unwrap();
        assert_eq!(blob.key, "");
        assert_eq!(blob.row_num, 2);

        let (partition, segment, decoded) = DeleteCodec::new().deserialize(&blob).unwrap();
        assert_eq!((partition, segment), (2, 3));
        assert_eq!(decoded, data);
    }

    #[test]
    fn serialize_rejects_misaligned_batch() {
        let data = DeleteData {
            pks: vec![PrimaryKey::Int64(1)],
            tss: vec![],
            row_count: 1,
        };
        assert!(DeleteCodec::new().serialize(1, 2, 3, &data).is_err());

        let data = DeleteData {
            pks: vec![PrimaryKey::Int64(1)],
            tss: vec![5],
            row_count: 4,
        };
        assert!(DeleteCodec::new().serialize(1, 2, 3, &data).is_err());
    }

    #[test]
    fn deserialize_rejects_other_kinds() {
        let descriptor = BinlogDescriptor {
            collection_id: 1,
            partition_id: 2,
            segment_id: 3,
            field_id: 100,
            data_type: None,
            row_count: 0,
        };
        let bytes = BinlogFile::new(LogKind::Stats, descriptor, b"{}".to_vec())
            .encode()
            .unwrap();
        let blob = Blob::new("", bytes, 0);
        assert!(matches!(
            DeleteCodec::new().deserialize(&blob),
            Err(CodecError::UnexpectedLogKind { .. })
        ));
    }
}
