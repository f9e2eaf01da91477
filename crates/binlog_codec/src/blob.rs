//! Named byte payloads produced by the codecs.

use crate::error::{CodecError, CodecResult};
use crate::schema::FieldId;
use bytes::Bytes;

/// An opaque payload plus the metadata the write path needs to file it.
///
/// Codecs name blobs by field id (`"100"`); blobs returned by a download
/// carry the storage key they were read from instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    /// Field id for freshly serialized blobs, storage key for downloaded ones.
    pub key: String,
    /// Encoded payload.
    pub value: Bytes,
    /// Number of rows (entries) encoded in the payload.
    pub row_num: u64,
}

impl Blob {
    /// Creates a blob.
    pub fn new(key: impl Into<String>, value: impl Into<Bytes>, row_num: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            row_num,
        }
    }

    /// Returns the payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Parses the key as a field id.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a decimal field id.
    pub fn field_id(&self) -> CodecResult<FieldId> {
        self.key.parse().map_err(|_| CodecError::InvalidBlobKey {
            key: self.key.clone(),
        })
    }
}
