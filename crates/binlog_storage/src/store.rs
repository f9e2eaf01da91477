//! Object store trait definition.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// A remote (or local) blob store holding immutable binlog objects.
///
/// Object stores are **opaque byte stores**. They read and write whole
/// objects by key; the binlog write path owns key naming, retries and
/// payload encoding.
///
/// # Invariants
///
/// - `read` returns exactly the bytes last written under that key
/// - `write` replaces the whole object atomically from a reader's view
/// - Errors carry enough classification for
///   [`StorageError::is_retryable`](crate::StorageError::is_retryable)
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryObjectStore`] - For testing
/// - [`super::LocalObjectStore`] - Files under a local directory
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the root prefix that every binlog key is composed under.
    fn root_path(&self) -> &str;

    /// Reads the whole object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The object does not exist
    /// - The caller is not permitted to read it
    /// - The backend fails (possibly transiently)
    async fn read(&self, key: &str) -> StorageResult<Bytes>;

    /// Writes `value` as the whole object stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed, the caller is not
    /// permitted to write it, or the backend fails.
    async fn write(&self, key: &str, value: Bytes) -> StorageResult<()>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    fn root_path(&self) -> &str {
        (**self).root_path()
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: Bytes) -> StorageResult<()> {
        (**self).write(key, value).await
    }
}
