//! Binlog upload: serialize, key and write insert, stats and delta logs.

use crate::cancel::CancelSignal;
use crate::error::{AllocError, BinlogIoResult};
use crate::io::BinlogIo;
use crate::keys::{make_key, LogType};
use crate::types::{FieldBinlog, FieldBinlogs};
use async_trait::async_trait;
use binlog_codec::{
    CollectionMeta, DeleteCodec, DeleteData, InsertCodec, InsertData, PrimaryKeyStats, UniqueId,
    DELETE_FIELD_ID,
};
use bytes::Bytes;
use std::collections::BTreeMap;

/// Payloads waiting to be written, keyed by storage key.
type PendingWrites = BTreeMap<String, Bytes>;

/// Persists row batches as binlogs.
///
/// Every method serializes and keys all of its logs first, then writes them
/// as one batch with [`BinlogIo::write_all`]. A codec or allocation failure
/// therefore happens before anything is written. Writes are retried until
/// they succeed or `cancel` fires.
#[async_trait]
pub trait BinlogUploader: Send + Sync {
    /// Writes one insert log per field of `data`.
    ///
    /// Returns `None` without allocating or writing anything when `data`
    /// holds no rows.
    ///
    /// # Errors
    ///
    /// Returns a codec, allocation or cancellation error.
    async fn upload_insert_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: &InsertData,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<Option<FieldBinlogs>>;

    /// Writes a stats log for `stats`, plus insert logs for `data` when it
    /// holds rows.
    ///
    /// The stats log is always written. Returns `(insert logs, stats logs)`.
    ///
    /// # Errors
    ///
    /// Returns a codec, allocation or cancellation error.
    #[allow(clippy::too_many_arguments)]
    async fn upload_stats_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: Option<&InsertData>,
        stats: &PrimaryKeyStats,
        total_rows: u64,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<(Option<FieldBinlogs>, FieldBinlogs)>;

    /// Writes one delta log for `data`.
    ///
    /// Returns `None` without allocating or writing anything when `data`
    /// holds no deletions.
    ///
    /// # Errors
    ///
    /// Returns a codec, allocation or cancellation error.
    async fn upload_delta_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: &DeleteData,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<Option<Vec<FieldBinlog>>>;
}

impl BinlogIo {
    /// Serializes `data` and keys each field blob with an id drawn from a
    /// sequence sized to the number of blobs.
    fn gen_insert_blobs(
        &self,
        codec: &InsertCodec<'_>,
        partition_id: UniqueId,
        segment_id: UniqueId,
        data: &InsertData,
        kvs: &mut PendingWrites,
    ) -> BinlogIoResult<FieldBinlogs> {
        let blobs = codec.serialize(partition_id, segment_id, data)?;
        let mut log_ids = self.allocator.open_sequence(blobs.len());
        let root = self.store.root_path();

        let mut paths = FieldBinlogs::new();
        for blob in blobs {
            let field_id = blob.field_id()?;
            let log_id = log_ids.next().ok_or_else(|| {
                AllocError::Unavailable("id sequence ended before every blob was keyed".into())
            })??;

            let key = make_key(
                root,
                LogType::Insert,
                codec.collection_id(),
                partition_id,
                segment_id,
                field_id,
                log_id,
            );
            paths.insert(
                field_id,
                FieldBinlog::single(field_id, key.clone(), blob.len() as u64, blob.row_num),
            );
            kvs.insert(key, blob.value);
        }

        Ok(paths)
    }

    /// Serializes `stats` and keys the blob with a freshly allocated id.
    fn gen_stats_blob(
        &self,
        codec: &InsertCodec<'_>,
        partition_id: UniqueId,
        segment_id: UniqueId,
        stats: &PrimaryKeyStats,
        total_rows: u64,
        kvs: &mut PendingWrites,
    ) -> BinlogIoResult<FieldBinlogs> {
        let blob = codec.serialize_pk_stats(stats, total_rows)?;
        let field_id = blob.field_id()?;
        let log_id = self.allocator.alloc_one()?;

        let key = make_key(
            self.store.root_path(),
            LogType::Stats,
            codec.collection_id(),
            partition_id,
            segment_id,
            field_id,
            log_id,
        );

        let mut paths = FieldBinlogs::new();
        paths.insert(
            field_id,
            FieldBinlog::single(field_id, key.clone(), blob.len() as u64, total_rows),
        );
        kvs.insert(key, blob.value);
        Ok(paths)
    }

    /// Serializes `data` and returns the delta key and payload.
    fn gen_delta_blob(
        &self,
        collection_id: UniqueId,
        partition_id: UniqueId,
        segment_id: UniqueId,
        data: &DeleteData,
    ) -> BinlogIoResult<(String, Bytes)> {
        let blob = DeleteCodec::new().serialize(collection_id, partition_id, segment_id, data)?;
        let log_id = self.allocator.alloc_one()?;

        let key = make_key(
            self.store.root_path(),
            LogType::Delta,
            collection_id,
            partition_id,
            segment_id,
            DELETE_FIELD_ID,
            log_id,
        );
        Ok((key, blob.value))
    }
}

#[async_trait]
impl BinlogUploader for BinlogIo {
    async fn upload_insert_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: &InsertData,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<Option<FieldBinlogs>> {
        if data.is_empty() {
            tracing::warn!(
                collection_id = meta.id,
                segment_id,
                "uploading empty insert data, nothing to write"
            );
            return Ok(None);
        }

        let codec = InsertCodec::new(meta);
        let mut kvs = PendingWrites::new();
        let paths = self.gen_insert_blobs(&codec, partition_id, segment_id, data, &mut kvs)?;

        self.write_all(cancel, meta.id, segment_id, kvs).await?;
        Ok(Some(paths))
    }

    async fn upload_stats_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: Option<&InsertData>,
        stats: &PrimaryKeyStats,
        total_rows: u64,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<(Option<FieldBinlogs>, FieldBinlogs)> {
        let codec = InsertCodec::new(meta);
        let mut kvs = PendingWrites::new();

        let insert_paths = match data.filter(|d| !d.is_empty()) {
            Some(data) => Some(
                self.gen_insert_blobs(&codec, partition_id, segment_id, data, &mut kvs)
                    .inspect_err(|e| {
                        tracing::warn!(
                            collection_id = meta.id,
                            segment_id,
                            error = %e,
                            "failed to generate insert blobs"
                        );
                    })?,
            ),
            None => None,
        };

        let stats_paths =
            self.gen_stats_blob(&codec, partition_id, segment_id, stats, total_rows, &mut kvs)?;

        self.write_all(cancel, meta.id, segment_id, kvs).await?;
        Ok((insert_paths, stats_paths))
    }

    async fn upload_delta_log(
        &self,
        cancel: &CancelSignal,
        segment_id: UniqueId,
        partition_id: UniqueId,
        data: &DeleteData,
        meta: &CollectionMeta,
    ) -> BinlogIoResult<Option<Vec<FieldBinlog>>> {
        if data.row_count == 0 {
            return Ok(None);
        }

        let (key, value) = self
            .gen_delta_blob(meta.id, partition_id, segment_id, data)
            .inspect_err(|e| {
                tracing::warn!(
                    collection_id = meta.id,
                    segment_id,
                    error = %e,
                    "failed to generate delta blob"
                );
            })?;

        let record = FieldBinlog::single(
            DELETE_FIELD_ID,
            key.clone(),
            value.len() as u64,
            data.row_count,
        );
        let kvs = PendingWrites::from([(key, value)]);

        self.write_all(cancel, meta.id, segment_id, kvs).await?;
        Ok(Some(vec![record]))
    }
}
