//! # Binlog Codec
//!
//! Row batch data model and the binlog encoding written to object storage.
//!
//! This crate turns in-memory batches into opaque [`Blob`]s and back:
//! - [`InsertCodec`] writes one insert blob per schema field, plus a stats
//!   blob summarizing the primary key column
//! - [`DeleteCodec`] writes one delta blob per delete batch
//!
//! Every blob is a self-describing binlog file (see [`format`]) carrying a
//! magic number, version, descriptor and CRC32 checksum.
//!
//! ## Usage
//!
//! ```
//! use binlog_codec::{DeleteCodec, DeleteData, PrimaryKey};
//!
//! let mut deletes = DeleteData::new();
//! deletes.append(PrimaryKey::Int64(7), 1000);
//!
//! let blob = DeleteCodec::new().serialize(1, 2, 3, &deletes).unwrap();
//! let (_, segment, decoded) = DeleteCodec::new().deserialize(&blob).unwrap();
//! assert_eq!(segment, 3);
//! assert_eq!(decoded, deletes);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod data;
mod delete;
mod error;
pub mod format;
mod insert;
mod schema;
mod stats;

pub use blob::Blob;
pub use data::{DeleteData, FieldData, InsertData, PrimaryKey};
pub use delete::{DeleteCodec, DELETE_FIELD_ID};
pub use error::{CodecError, CodecResult};
pub use format::{BinlogDescriptor, BinlogFile, LogKind};
pub use insert::InsertCodec;
pub use schema::{
    CollectionMeta, CollectionSchema, DataType, FieldId, FieldSchema, UniqueId, ROW_ID_FIELD_ID,
    START_OF_USER_FIELD_ID, TIMESTAMP_FIELD_ID,
};
pub use stats::PrimaryKeyStats;
