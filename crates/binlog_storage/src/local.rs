//! Local filesystem object store.

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// An object store that keeps every object as a file under a root directory.
///
/// Keys are `/`-separated paths. A key that starts with the store's
/// [`root_path`](ObjectStore::root_path) is taken as-is; any other key is
/// resolved relative to the root. Keys may not escape the root.
///
/// # Durability
///
/// Writes land in a hidden temporary file next to the target, which is
/// synced to disk and then renamed into place; the parent directory is
/// synced after the rename. Readers never observe a partial object, and
/// an acknowledged write survives a crash.
///
/// # Example
///
/// ```no_run
/// use binlog_storage::{LocalObjectStore, ObjectStore};
/// use bytes::Bytes;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let store = LocalObjectStore::open("/var/lib/binlogs").await.unwrap();
///     let key = format!("{}/insert_log/1/2/3/100/7", store.root_path());
///     store.write(&key, Bytes::from_static(b"payload")).await.unwrap();
/// });
/// ```
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    dir: PathBuf,
    root: String,
}

impl LocalObjectStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        let root = dir
            .to_string_lossy()
            .trim_end_matches('/')
            .to_string();
        Ok(Self { dir, root })
    }

    /// Returns the directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists every stored key starting with `prefix`, sorted.
    ///
    /// Pass `""` or the root path to list everything.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory under the root cannot be read.
    pub async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if is_temp_file(&path) {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.dir) else {
                    continue;
                };
                let key = self.key_for(relative);
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn key_for(&self, relative: &Path) -> String {
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if self.root.is_empty() {
            parts.join("/")
        } else {
            format!("{}/{}", self.root, parts.join("/"))
        }
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key(key, "key is empty"));
        }

        let relative = match key.strip_prefix(self.root.as_str()) {
            Some(rest) if !self.root.is_empty() && rest.starts_with('/') => &rest[1..],
            _ => key,
        };

        let relative = Path::new(relative);
        let mut resolved = self.dir.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::invalid_key(
                        key,
                        "key must stay inside the store root",
                    ))
                }
            }
        }

        if resolved == self.dir {
            return Err(StorageError::invalid_key(key, "key names the store root"));
        }
        Ok(resolved)
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') && name.ends_with(".tmp")
        })
        .unwrap_or(false)
}

/// Writes `value` to `temp`, syncs it and renames it to `path`.
///
/// Steps:
/// 1. Write and fsync the temporary file
/// 2. Rename it over the target
/// 3. Fsync the parent directory so the rename is durable
async fn persist(temp: &Path, path: &Path, value: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(temp).await?;
    file.write_all(value).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(temp, path).await?;

    if let Some(parent) = path.parent() {
        sync_directory(parent).await?;
    }
    Ok(())
}

#[cfg(unix)]
async fn sync_directory(dir: &Path) -> io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_directory(_dir: &Path) -> io::Result<()> {
    // NTFS journals metadata; directories cannot be opened for fsync.
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn root_path(&self) -> &str {
        &self.root
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let path = self.resolve(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::from_io(key, e))?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, key: &str, value: Bytes) -> StorageResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(key, e))?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::invalid_key(key, "key has no file name"))?;
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        if let Err(e) = persist(&temp, &path, &value).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StorageError::from_io(key, e));
        }

        tracing::trace!(key, size = value.len(), "object written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn local_open_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("root");

        let store = LocalObjectStore::open(&root).await.unwrap();
        assert!(root.exists());
        assert_eq!(store.dir(), root);
        assert_eq!(store.root_path(), root.to_string_lossy());
    }

    #[tokio::test]
    async fn local_write_and_read_full_key() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();
        let key = format!("{}/insert_log/1/2/3/100/7", store.root_path());

        store
            .write(&key, Bytes::from_static(b"payload"))
            .await
            .unwrap();

        assert!(dir.path().join("insert_log/1/2/3/100/7").exists());
        assert_eq!(&store.read(&key).await.unwrap()[..], b"payload");
    }

    #[tokio::test]
    async fn local_relative_key_resolves_under_root() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();

        store
            .write("delta_log/1/2/3/9", Bytes::from_static(b"d"))
            .await
            .unwrap();
        let full = format!("{}/delta_log/1/2/3/9", store.root_path());
        assert_eq!(&store.read(&full).await.unwrap()[..], b"d");
    }

    #[tokio::test]
    async fn local_read_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();

        let err = store.read("stats_log/1/2/3/4/5").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn local_rejects_escaping_keys() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();

        let err = store
            .write("../outside", Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));

        let err = store.read("").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn local_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();

        store.write("a/b", Bytes::from_static(b"one")).await.unwrap();
        store.write("a/b", Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(&store.read("a/b").await.unwrap()[..], b"two");
        let names: Vec<_> = std::fs::read_dir(dir.path().join("a"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[tokio::test]
    async fn local_failed_write_removes_temp_file() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();
        store
            .write("seg/100", Bytes::from_static(b"column"))
            .await
            .unwrap();

        // "seg" is now a directory, so renaming a file over it fails.
        let err = store.write("seg", Bytes::from_static(b"x")).await;
        assert!(err.is_err());

        assert!(!dir.path().join(".seg.tmp").exists());
        assert_eq!(
            store.read("seg/100").await.unwrap(),
            Bytes::from_static(b"column")
        );
    }

    #[tokio::test]
    async fn local_list_by_prefix() {
        let dir = tempdir().unwrap();
        let store = LocalObjectStore::open(dir.path()).await.unwrap();
        let root = store.root_path().to_string();

        store.write("insert_log/1/2/3/100/1", Bytes::new()).await.unwrap();
        store.write("insert_log/1/2/3/101/2", Bytes::new()).await.unwrap();
        store.write("delta_log/1/2/3/3", Bytes::new()).await.unwrap();

        let all = store.list("").await.unwrap();
        assert_eq!(all.len(), 3);

        let inserts = store.list(&format!("{root}/insert_log")).await.unwrap();
        assert_eq!(
            inserts,
            vec![
                format!("{root}/insert_log/1/2/3/100/1"),
                format!("{root}/insert_log/1/2/3/101/2"),
            ]
        );
    }
}
