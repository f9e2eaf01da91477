//! Parallel binlog download.

use crate::cancel::CancelSignal;
use crate::error::{BinlogIoError, BinlogIoResult};
use crate::io::BinlogIo;
use crate::pool::TaskHandle;
use crate::retry::read_with_retry;
use async_trait::async_trait;
use binlog_codec::Blob;
use std::sync::Arc;

/// Reads groups of binlogs back from the object store.
#[async_trait]
pub trait BinlogDownloader: Send + Sync {
    /// Downloads every key, returning one blob per key in input order.
    ///
    /// Each read is retried only for retryable backend errors, within the
    /// configured attempt budget. `cancel` is consulted only while reads
    /// are being submitted; reads already running are not interrupted.
    ///
    /// # Errors
    ///
    /// Results are awaited in key order, so the error returned is the one
    /// for the earliest failing key, reported only once every read before
    /// it has finished. A later key that fails quickly still waits behind
    /// slower earlier keys. The other results are discarded and reads
    /// still running are aborted.
    async fn download(&self, cancel: &CancelSignal, keys: &[String]) -> BinlogIoResult<Vec<Blob>>;
}

#[async_trait]
impl BinlogDownloader for BinlogIo {
    async fn download(&self, cancel: &CancelSignal, keys: &[String]) -> BinlogIoResult<Vec<Blob>> {
        tracing::debug!(count = keys.len(), "downloading binlogs");
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut handles: Vec<TaskHandle<Blob>> = Vec::with_capacity(keys.len());
        for (submitted, key) in keys.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(BinlogIoError::DownloadCancelled {
                    submitted,
                    total: keys.len(),
                });
            }

            let store = Arc::clone(&self.store);
            let policy = self.config.read_retry.clone();
            let key = key.clone();
            handles.push(self.pool.submit(async move {
                tracing::debug!(path = %key, "downloading binlog");
                let value = read_with_retry(store.as_ref(), &key, &policy).await?;
                Ok(Blob::new(key, value, 0))
            }));
        }

        let mut blobs = Vec::with_capacity(handles.len());
        for handle in handles {
            // Handles not yet joined abort their reads when dropped.
            blobs.push(handle.join().await?);
        }
        Ok(blobs)
    }
}
