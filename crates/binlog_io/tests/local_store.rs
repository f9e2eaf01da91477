//! End-to-end flush against the filesystem object store.

use binlog_codec::{DeleteCodec, InsertCodec};
use binlog_io::{
    parse_log_path, Allocator, BinlogDownloader, BinlogIo, BinlogUploader, CancelSignal,
    LocalAllocator, LogType, TaskPool,
};
use binlog_storage::ObjectStore;
use binlog_testkit::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn segment_flush_lands_on_disk() {
    let (_dir, store) = temp_local_store().await;
    let store = Arc::new(store);
    let io = BinlogIo::new(
        Arc::clone(&store) as Arc<dyn ObjectStore>,
        Arc::new(LocalAllocator::new(500)) as Arc<dyn Allocator>,
        TaskPool::new(4),
    );
    let meta = sample_meta();
    let data = sample_insert_data(8);
    let deletes = sample_delete_data(3);
    let cancel = CancelSignal::new();

    let (inserts, stats) = io
        .upload_stats_log(&cancel, 7, 6, Some(&data), &sample_pk_stats(&data), 8, &meta)
        .await
        .unwrap();
    let delta = io
        .upload_delta_log(&cancel, 7, 6, &deletes, &meta)
        .await
        .unwrap()
        .unwrap();

    let on_disk = store.list("").await.unwrap();
    let inserts = inserts.unwrap();
    assert_eq!(on_disk.len(), inserts.len() + stats.len() + delta.len());

    let root = store.root_path().to_string();
    let mut types: Vec<LogType> = on_disk
        .iter()
        .map(|key| parse_log_path(&root, key).unwrap().log_type)
        .collect();
    types.dedup();
    assert!(types.contains(&LogType::Insert));
    assert!(types.contains(&LogType::Stats));
    assert!(types.contains(&LogType::Delta));

    let insert_paths: Vec<String> = inserts
        .values()
        .map(|f| f.binlogs[0].log_path.clone())
        .collect();
    let blobs = io.download(&cancel, &insert_paths).await.unwrap();
    let (_, _, decoded) = InsertCodec::new(&meta).deserialize(&blobs).unwrap();
    assert_eq!(decoded, data);

    let delta_blob = io
        .download(&cancel, &[delta[0].binlogs[0].log_path.clone()])
        .await
        .unwrap()
        .remove(0);
    let (_, segment, decoded) = DeleteCodec::new().deserialize(&delta_blob).unwrap();
    assert_eq!(segment, 7);
    assert_eq!(decoded, deletes);
}
