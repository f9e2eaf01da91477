//! # Binlog Storage
//!
//! Object store abstraction for binlog persistence.
//!
//! Object stores are **opaque key/value blob stores** - they do not
//! interpret the payloads they hold and know nothing about binlog formats,
//! segments or collections. The write path above them owns naming, retry
//! policy and encoding.
//!
//! ## Design Principles
//!
//! - Stores expose point reads and writes of whole objects
//! - Every key written by the write path already carries [`ObjectStore::root_path`]
//! - Errors are classified so callers can decide what is worth retrying
//! - Implementations must be `Send + Sync` and safe for concurrent use
//!
//! ## Available Stores
//!
//! - [`InMemoryObjectStore`] - For testing and ephemeral deployments
//! - [`LocalObjectStore`] - Objects stored as files under a root directory
//!
//! ## Example
//!
//! ```rust
//! use binlog_storage::{InMemoryObjectStore, ObjectStore};
//! use bytes::Bytes;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store = InMemoryObjectStore::new("files");
//!     store.write("files/a", Bytes::from_static(b"hello")).await.unwrap();
//!     let data = store.read("files/a").await.unwrap();
//!     assert_eq!(&data[..], b"hello");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod local;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
pub use store::ObjectStore;
