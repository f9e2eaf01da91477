//! The binlog I/O service.

use crate::allocator::Allocator;
use crate::cancel::CancelSignal;
use crate::config::BinlogIoConfig;
use crate::error::BinlogIoResult;
use crate::pool::{await_all, TaskPool};
use crate::retry::{write_until_done, WriteTarget};
use binlog_codec::UniqueId;
use binlog_storage::ObjectStore;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Uploads and downloads binlogs against an object store.
///
/// All reads and writes run on the injected [`TaskPool`], so the pool
/// capacity bounds the number of in-flight backend calls across every
/// operation sharing it.
///
/// See [`BinlogUploader`](crate::BinlogUploader) and
/// [`BinlogDownloader`](crate::BinlogDownloader) for the operations.
#[derive(Clone)]
pub struct BinlogIo {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) allocator: Arc<dyn Allocator>,
    pub(crate) pool: TaskPool,
    pub(crate) config: BinlogIoConfig,
}

impl BinlogIo {
    /// Creates a service with default configuration.
    pub fn new(store: Arc<dyn ObjectStore>, allocator: Arc<dyn Allocator>, pool: TaskPool) -> Self {
        Self::with_config(store, allocator, pool, BinlogIoConfig::default())
    }

    /// Creates a service with the given configuration.
    ///
    /// The pool is used as given; `config.pool_size` is only consulted by
    /// [`TaskPool::from_config`].
    pub fn with_config(
        store: Arc<dyn ObjectStore>,
        allocator: Arc<dyn Allocator>,
        pool: TaskPool,
        config: BinlogIoConfig,
    ) -> Self {
        Self {
            store,
            allocator,
            pool,
            config,
        }
    }

    /// Returns the object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Returns the task pool.
    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BinlogIoConfig {
        &self.config
    }

    /// Writes every `(key, payload)` pair, one pooled task per pair.
    ///
    /// Each write is retried after `config.write_backoff` until it succeeds
    /// or `cancel` fires. The call returns once every task has finished;
    /// writes that succeeded before a cancellation are not rolled back.
    /// Dropping the returned future aborts every write still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`BinlogIoError::Cancelled`](crate::BinlogIoError::Cancelled)
    /// if any write was cancelled.
    pub async fn write_all(
        &self,
        cancel: &CancelSignal,
        collection_id: UniqueId,
        segment_id: UniqueId,
        kvs: BTreeMap<String, Bytes>,
    ) -> BinlogIoResult<()> {
        tracing::debug!(collection_id, segment_id, count = kvs.len(), "uploading binlogs");
        if kvs.is_empty() {
            return Ok(());
        }

        let target = WriteTarget {
            collection_id,
            segment_id,
        };
        let handles: Vec<_> = kvs
            .into_iter()
            .map(|(key, value)| {
                let store = Arc::clone(&self.store);
                let cancel = cancel.clone();
                let backoff = self.config.write_backoff;
                self.pool.submit(async move {
                    write_until_done(store.as_ref(), &key, value, &cancel, backoff, target).await
                })
            })
            .collect();

        await_all(handles).await.map(|_| ())
    }
}

impl fmt::Debug for BinlogIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinlogIo")
            .field("root", &self.store.root_path())
            .field("pool", &self.pool)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
