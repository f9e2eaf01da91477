//! Verify command implementation.

use binlog_codec::{BinlogFile, LogKind};
use binlog_io::{parse_log_path, LogPath, LogType};
use binlog_storage::{LocalObjectStore, ObjectStore, StorageResult};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of binlogs checked.
    pub binlogs_checked: usize,
    /// Number of valid binlogs.
    pub valid_binlogs: usize,
    /// Number of corrupt or misplaced binlogs.
    pub corrupt_binlogs: usize,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.corrupt_binlogs == 0 && self.errors.is_empty()
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(error = %message, "binlog failed verification");
        self.corrupt_binlogs += 1;
        self.errors.push(message);
    }
}

/// Runs the verify command.
pub async fn run(dir: &Path, prefix: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying binlogs under {:?}", dir);
    println!();

    let store = LocalObjectStore::open(dir).await?;
    let result = verify_store(&store, prefix).await?;

    println!("  Binlogs checked: {}", result.binlogs_checked);
    println!("  Valid:           {}", result.valid_binlogs);
    println!("  Corrupt:         {}", result.corrupt_binlogs);
    for error in &result.errors {
        println!("    - {}", error);
    }

    println!();
    if result.is_ok() {
        println!("✓ Binlog verification passed");
        Ok(())
    } else {
        println!("✗ Binlog verification failed");
        Err("Verification failed".into())
    }
}

/// Decodes every binlog whose key starts with `prefix` and checks that its
/// header agrees with its key.
pub async fn verify_store(store: &LocalObjectStore, prefix: &str) -> StorageResult<VerifyResult> {
    let mut result = VerifyResult::default();
    let root = store.root_path().to_string();

    for key in store.list(prefix).await? {
        result.binlogs_checked += 1;

        let path = match parse_log_path(&root, &key) {
            Ok(path) => path,
            Err(e) => {
                result.fail(e.to_string());
                continue;
            }
        };

        let value = store.read(&key).await?;
        let file = match BinlogFile::decode(&value) {
            Ok(file) => file,
            Err(e) => {
                result.fail(format!("{key}: {e}"));
                continue;
            }
        };

        match check_placement(&path, &file) {
            Ok(()) => result.valid_binlogs += 1,
            Err(reason) => result.fail(format!("{key}: {reason}")),
        }
    }

    Ok(result)
}

fn check_placement(path: &LogPath, file: &BinlogFile) -> Result<(), String> {
    let expected_kind = match path.log_type {
        LogType::Insert => LogKind::Insert,
        LogType::Stats => LogKind::Stats,
        LogType::Delta => LogKind::Delete,
    };
    if file.kind != expected_kind {
        return Err(format!("{} log filed under {}", file.kind, path.log_type));
    }

    let d = &file.descriptor;
    if d.collection_id != path.collection_id {
        return Err(format!(
            "collection {} in header, {} in key",
            d.collection_id, path.collection_id
        ));
    }
    // Stats headers do not carry partition or segment ids.
    if path.log_type != LogType::Stats
        && (d.partition_id, d.segment_id) != (path.partition_id, path.segment_id)
    {
        return Err(format!(
            "segment {}/{} in header, {}/{} in key",
            d.partition_id, d.segment_id, path.partition_id, path.segment_id
        ));
    }
    if let Some(field_id) = path.field_id {
        if d.field_id != field_id {
            return Err(format!("field {} in header, {} in key", d.field_id, field_id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binlog_io::{Allocator, BinlogIo, BinlogUploader, CancelSignal, LocalAllocator, TaskPool};
    use binlog_testkit::{sample_delete_data, sample_insert_data, sample_meta, sample_pk_stats};
    use std::sync::Arc;

    async fn flushed_store() -> (tempfile::TempDir, Arc<LocalObjectStore>) {
        let (dir, store) = binlog_testkit::temp_local_store().await;
        let store = Arc::new(store);
        let io = BinlogIo::new(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::new(LocalAllocator::default()) as Arc<dyn Allocator>,
            TaskPool::new(2),
        );
        let meta = sample_meta();
        let data = sample_insert_data(3);
        let cancel = CancelSignal::new();
        io.upload_stats_log(&cancel, 3, 2, Some(&data), &sample_pk_stats(&data), 3, &meta)
            .await
            .unwrap();
        io.upload_delta_log(&cancel, 3, 2, &sample_delete_data(2), &meta)
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn clean_store_verifies() {
        let (_dir, store) = flushed_store().await;
        let result = verify_store(&store, "").await.unwrap();

        assert_eq!(result.binlogs_checked, 7);
        assert_eq!(result.valid_binlogs, 7);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn corrupt_and_misplaced_binlogs_are_reported() {
        let (_dir, store) = flushed_store().await;
        let keys = store.list("").await.unwrap();

        let mut bytes = store.read(&keys[0]).await.unwrap().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        store.write(&keys[0], bytes.into()).await.unwrap();

        let stray = format!("{}/notes.txt", store.root_path());
        store.write(&stray, "hello".into()).await.unwrap();

        let result = verify_store(&store, "").await.unwrap();
        assert_eq!(result.binlogs_checked, 8);
        assert_eq!(result.corrupt_binlogs, 2);
        assert!(!result.is_ok());
    }
}
