//! # Binlog I/O
//!
//! The durable write path of an ingestion node: persists row batches to an
//! object store as immutable binlogs and reads them back.
//!
//! This crate provides:
//! - Deterministic storage keys for insert, stats and delta logs
//! - An id allocator seam with lazy, closable id sequences
//! - A bounded task pool shared by every read and write
//! - Downloads that retry retryable errors a bounded number of times
//! - Uploads that retry every failure until they succeed or are cancelled
//!
//! ## Architecture
//!
//! ```text
//! caller ─▶ BinlogUploader ─▶ codec ─▶ allocator ─▶ keys ─▶ TaskPool ─▶ ObjectStore
//! caller ─▶ BinlogDownloader ────────────────────────────▶ TaskPool ─▶ ObjectStore
//! ```
//!
//! ## Key Invariants
//!
//! - A key written once is never reused for different content
//! - `log_size` of every returned record is the exact payload length
//! - Uploading empty input allocates nothing and writes nothing
//! - Downloads return blobs in key order
//!
//! ## Usage
//!
//! ```
//! use binlog_codec::{CollectionMeta, CollectionSchema, FieldData, InsertData};
//! use binlog_io::{
//!     BinlogDownloader, BinlogIo, BinlogUploader, CancelSignal, LocalAllocator, TaskPool,
//! };
//! use binlog_storage::InMemoryObjectStore;
//! use std::sync::Arc;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let io = BinlogIo::new(
//!         Arc::new(InMemoryObjectStore::new("files")),
//!         Arc::new(LocalAllocator::default()),
//!         TaskPool::new(8),
//!     );
//!     let meta = CollectionMeta::new(1, CollectionSchema::new("docs"));
//!     let data = InsertData::new()
//!         .with_field(0, FieldData::Int64(vec![1, 2]))
//!         .with_field(1, FieldData::Int64(vec![10, 20]));
//!
//!     let cancel = CancelSignal::new();
//!     let logs = io
//!         .upload_insert_log(&cancel, 3, 2, &data, &meta)
//!         .await
//!         .unwrap()
//!         .unwrap();
//!
//!     let paths: Vec<String> = logs.values().map(|f| f.binlogs[0].log_path.clone()).collect();
//!     let blobs = io.download(&cancel, &paths).await.unwrap();
//!     assert_eq!(blobs.len(), 2);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod allocator;
mod cancel;
mod config;
mod downloader;
mod error;
mod io;
mod keys;
mod pool;
mod retry;
mod types;
mod uploader;

pub use allocator::{Allocator, IdSequence, LocalAllocator};
pub use cancel::CancelSignal;
pub use config::{BinlogIoConfig, RetryConfig, DEFAULT_POOL_SIZE, DEFAULT_WRITE_BACKOFF};
pub use downloader::BinlogDownloader;
pub use error::{AllocError, AllocResult, BinlogIoError, BinlogIoResult};
pub use io::BinlogIo;
pub use keys::{join_id_path, make_key, parse_log_path, LogPath, LogType};
pub use pool::{await_all, TaskHandle, TaskPool};
pub use types::{Binlog, FieldBinlog, FieldBinlogs};
pub use uploader::BinlogUploader;
