//! Test fixtures: schemas, batches and a ready-made binlog I/O harness.

use crate::faults::FaultyObjectStore;
use binlog_codec::{
    CollectionMeta, CollectionSchema, DataType, DeleteData, FieldData, FieldId, FieldSchema,
    InsertData, PrimaryKey, PrimaryKeyStats, UniqueId, ROW_ID_FIELD_ID, TIMESTAMP_FIELD_ID,
};
use binlog_io::{Allocator, BinlogIo, BinlogIoConfig, LocalAllocator, RetryConfig, TaskPool};
use binlog_storage::{LocalObjectStore, ObjectStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Root prefix used by every fixture store.
pub const TEST_ROOT: &str = "files";

/// Collection id used by [`sample_meta`].
pub const TEST_COLLECTION_ID: UniqueId = 1;

/// Primary key field of [`sample_schema`].
pub const PK_FIELD_ID: FieldId = 100;

/// Vector dimension of [`sample_schema`].
pub const VECTOR_DIM: usize = 4;

/// A schema with an int64 primary key, a varchar field and a float vector.
pub fn sample_schema() -> CollectionSchema {
    CollectionSchema::new("fixture")
        .with_field(FieldSchema::new(PK_FIELD_ID, "pk", DataType::Int64).primary_key())
        .with_field(FieldSchema::new(101, "title", DataType::VarChar))
        .with_field(FieldSchema::float_vector(102, "embedding", VECTOR_DIM))
}

/// Collection metadata for [`sample_schema`].
pub fn sample_meta() -> CollectionMeta {
    CollectionMeta::new(TEST_COLLECTION_ID, sample_schema())
}

/// A batch of `rows` rows matching [`sample_schema`].
///
/// Primary keys are `0, 10, 20, ...`.
pub fn sample_insert_data(rows: usize) -> InsertData {
    let ids: Vec<i64> = (0..rows as i64).collect();
    InsertData::new()
        .with_field(ROW_ID_FIELD_ID, FieldData::Int64(ids.clone()))
        .with_field(
            TIMESTAMP_FIELD_ID,
            FieldData::Int64(ids.iter().map(|i| 1_000 + i).collect()),
        )
        .with_field(
            PK_FIELD_ID,
            FieldData::Int64(ids.iter().map(|i| i * 10).collect()),
        )
        .with_field(
            101,
            FieldData::VarChar(ids.iter().map(|i| format!("row-{i}")).collect()),
        )
        .with_field(
            102,
            FieldData::FloatVector {
                dim: VECTOR_DIM,
                data: ids
                    .iter()
                    .flat_map(|i| (0..VECTOR_DIM).map(move |d| (*i as f32) + d as f32 / 10.0))
                    .collect(),
            },
        )
}

/// A batch matching [`sample_schema`] with every column empty.
pub fn empty_insert_data() -> InsertData {
    sample_insert_data(0)
}

/// A delete batch of `rows` int64 keys.
pub fn sample_delete_data(rows: usize) -> DeleteData {
    let mut data = DeleteData::new();
    for i in 0..rows as i64 {
        data.append(PrimaryKey::Int64(i * 10), 2_000 + i as u64);
    }
    data
}

/// Primary key stats over the primary key column of `data`.
///
/// Empty stats when `data` has no primary key column.
pub fn sample_pk_stats(data: &InsertData) -> PrimaryKeyStats {
    let mut stats = PrimaryKeyStats {
        field_id: PK_FIELD_ID,
        pk_type: DataType::Int64,
        min: None,
        max: None,
    };
    if let Some(column) = data.field(PK_FIELD_ID) {
        stats
            .update_from_column(column)
            .expect("fixture primary key column is int64");
    }
    stats
}

/// Configuration with short delays, so retry tests run fast.
pub fn fast_config(pool_size: usize) -> BinlogIoConfig {
    BinlogIoConfig::new()
        .with_pool_size(pool_size)
        .with_read_retry(
            RetryConfig::new(3)
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5)),
        )
        .with_write_backoff(Duration::from_millis(5))
}

/// A binlog I/O service wired to a fault-injecting store and a local
/// allocator, both kept for inspection.
pub struct TestHarness {
    /// The object store behind `io`.
    pub store: Arc<FaultyObjectStore>,
    /// The allocator behind `io`.
    pub allocator: Arc<LocalAllocator>,
    /// The service under test.
    pub io: BinlogIo,
}

impl TestHarness {
    /// Creates a harness with a pool of `pool_size` and [`fast_config`].
    pub fn new(pool_size: usize) -> Self {
        Self::with_config(fast_config(pool_size))
    }

    /// Creates a harness with the given configuration.
    pub fn with_config(config: BinlogIoConfig) -> Self {
        let store = Arc::new(FaultyObjectStore::new(TEST_ROOT));
        let allocator = Arc::new(LocalAllocator::new(1_000));
        let pool = TaskPool::from_config(&config);
        let io = BinlogIo::with_config(
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&allocator) as Arc<dyn Allocator>,
            pool,
            config,
        );
        Self {
            store,
            allocator,
            io,
        }
    }
}

/// Opens a local object store in a fresh temporary directory.
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub async fn temp_local_store() -> (TempDir, LocalObjectStore) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let store = LocalObjectStore::open(dir.path())
        .await
        .expect("Failed to open local object store");
    (dir, store)
}
