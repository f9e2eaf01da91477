//! Read and write retry loops.
//!
//! Reads use a bounded budget and give up on the first non-retryable
//! error. Writes retry every failure after a fixed pause until they
//! succeed or the caller cancels.

use crate::cancel::CancelSignal;
use crate::config::RetryConfig;
use crate::error::{BinlogIoError, BinlogIoResult};
use binlog_codec::UniqueId;
use binlog_storage::{ObjectStore, StorageResult};
use bytes::Bytes;
use std::time::Duration;

/// Reads `key`, retrying retryable errors up to `policy.max_attempts` times.
pub(crate) async fn read_with_retry(
    store: &dyn ObjectStore,
    key: &str,
    policy: &RetryConfig,
) -> StorageResult<Bytes> {
    let mut attempt = 0u32;
    loop {
        match store.read(key).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                tracing::warn!(path = %key, attempt, error = %e, "failed to download binlog");
                if !e.is_retryable() || attempt >= policy.max_attempts {
                    return Err(e);
                }
                let delay = policy.delay_for_attempt(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Where a write belongs, for errors and logs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriteTarget {
    pub collection_id: UniqueId,
    pub segment_id: UniqueId,
}

/// Writes `value` to `key` until it succeeds or `cancel` fires.
///
/// Every failure is retried after `backoff`; cancellation is checked before
/// each attempt and observed during the pause.
pub(crate) async fn write_until_done(
    store: &dyn ObjectStore,
    key: &str,
    value: Bytes,
    cancel: &CancelSignal,
    backoff: Duration,
    target: WriteTarget,
) -> BinlogIoResult<()> {
    let cancelled = || {
        tracing::warn!(
            collection_id = target.collection_id,
            segment_id = target.segment_id,
            path = %key,
            "cancelled while saving binlog to object store"
        );
        BinlogIoError::Cancelled {
            collection_id: target.collection_id,
            segment_id: target.segment_id,
        }
    };

    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        match store.write(key, value.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    collection_id = target.collection_id,
                    segment_id = target.segment_id,
                    path = %key,
                    attempt,
                    error = %e,
                    "failed to upload binlog, retrying"
                );
            }
        }

        tokio::select! {
            () = cancel.cancelled() => return Err(cancelled()),
            () = tokio::time::sleep(backoff) => {}
        }
    }
}
