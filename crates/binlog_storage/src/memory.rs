//! In-memory object store for testing.

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An in-memory object store.
///
/// This store keeps every object in a map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral nodes that don't need persistence
///
/// Reads and writes are counted so tests can assert how many backend
/// calls an operation performed.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks.
///
/// # Example
///
/// ```rust
/// use binlog_storage::{InMemoryObjectStore, ObjectStore};
/// use bytes::Bytes;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let store = InMemoryObjectStore::new("files");
///     store.write("files/k", Bytes::from_static(b"v")).await.unwrap();
///     assert_eq!(store.write_count(), 1);
///     assert!(store.contains("files/k"));
/// });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    root: String,
    objects: RwLock<HashMap<String, Bytes>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryObjectStore {
    /// Creates a new empty store with the given root prefix.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Creates a store with pre-existing objects.
    ///
    /// Useful for testing read paths.
    #[must_use]
    pub fn with_objects(root: impl Into<String>, objects: HashMap<String, Bytes>) -> Self {
        Self {
            root: root.into(),
            objects: RwLock::new(objects),
            ..Self::default()
        }
    }

    /// Returns all keys currently stored, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Returns true if an object exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    /// Returns the object stored under `key` without counting a read.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().get(key).cloned()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns true if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Number of `read` calls served so far, successful or not.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls served so far, successful or not.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Removes every object and resets the call counters.
    pub fn clear(&self) {
        self.objects.write().clear();
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn root_path(&self) -> &str {
        &self.root
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn write(&self, key: &str, value: Bytes) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if key.is_empty() {
            return Err(StorageError::invalid_key(key, "key is empty"));
        }
        self.objects.write().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_new_is_empty() {
        let store = InMemoryObjectStore::new("files");
        assert!(store.is_empty());
        assert_eq!(store.root_path(), "files");
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn memory_write_then_read() {
        let store = InMemoryObjectStore::new("files");
        store
            .write("files/a/1", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let data = store.read("files/a/1").await.unwrap();
        assert_eq!(&data[..], b"hello");
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn memory_overwrite_replaces_object() {
        let store = InMemoryObjectStore::new("files");
        store.write("k", Bytes::from_static(b"one")).await.unwrap();
        store.write("k", Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(store.get("k").unwrap(), Bytes::from_static(b"two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_read_missing_is_not_found() {
        let store = InMemoryObjectStore::new("files");
        let err = store.read("files/missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn memory_empty_key_rejected() {
        let store = InMemoryObjectStore::new("files");
        let err = store.write("", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn memory_with_objects_and_keys() {
        let mut objects = HashMap::new();
        objects.insert("b".to_string(), Bytes::from_static(b"2"));
        objects.insert("a".to_string(), Bytes::from_static(b"1"));
        let store = InMemoryObjectStore::with_objects("", objects);

        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(&store.read("a").await.unwrap()[..], b"1");
    }

    #[tokio::test]
    async fn memory_clear_resets_counters() {
        let store = InMemoryObjectStore::new("files");
        store.write("k", Bytes::from_static(b"v")).await.unwrap();
        store.read("k").await.unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.read_count(), 0);
        assert_eq!(store.write_count(), 0);
    }
}
