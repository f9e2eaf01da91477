//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode bytes.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
    },

    /// The blob does not start with the binlog magic bytes.
    #[error("invalid binlog magic: {found:02x?}")]
    InvalidMagic {
        /// The bytes found where the magic was expected.
        found: [u8; 4],
    },

    /// The binlog format version is not understood.
    #[error("unsupported binlog version {version}, max supported is {max_supported}")]
    UnsupportedVersion {
        /// Version found in the blob.
        version: u16,
        /// Newest version this codec reads.
        max_supported: u16,
    },

    /// Checksum validation failed.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum stored in the blob.
        expected: u32,
        /// Checksum computed over the blob.
        actual: u32,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A blob of one log kind was handed to a decoder for another.
    #[error("unexpected log kind: expected {expected}, got {actual}")]
    UnexpectedLogKind {
        /// The kind the decoder accepts.
        expected: String,
        /// The kind found in the blob.
        actual: String,
    },

    /// The row batch does not fit the collection schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Columns of one batch hold different numbers of rows.
    #[error("row count mismatch on field {field_id}: expected {expected}, got {actual}")]
    RowCountMismatch {
        /// Field whose column is misaligned.
        field_id: i64,
        /// Row count of the batch.
        expected: usize,
        /// Row count of the offending column.
        actual: usize,
    },

    /// A blob key is not a field identifier.
    #[error("invalid blob key {key:?}")]
    InvalidBlobKey {
        /// The offending key.
        key: String,
    },
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error.
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }
}
