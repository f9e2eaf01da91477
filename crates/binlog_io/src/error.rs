//! Error types for binlog I/O.

use binlog_codec::{CodecError, UniqueId};
use binlog_storage::StorageError;
use thiserror::Error;

/// Result type for binlog I/O operations.
pub type BinlogIoResult<T> = Result<T, BinlogIoError>;

/// Result type for id allocation.
pub type AllocResult<T> = Result<T, AllocError>;

/// Errors raised by an id allocator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The id space is used up.
    #[error("id allocator exhausted at {ceiling}")]
    Exhausted {
        /// Highest id the allocator may hand out.
        ceiling: UniqueId,
    },

    /// The allocator could not be reached.
    #[error("id allocator unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur while uploading or downloading binlogs.
#[derive(Error, Debug)]
pub enum BinlogIoError {
    /// The object store rejected a read or write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A batch could not be serialized.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// No id could be allocated for a log key.
    #[error("allocation error: {0}")]
    Alloc(#[from] AllocError),

    /// The caller cancelled a write batch before every write succeeded.
    #[error("upload cancelled for collection {collection_id}, segment {segment_id}")]
    Cancelled {
        /// Collection being written.
        collection_id: UniqueId,
        /// Segment being written.
        segment_id: UniqueId,
    },

    /// The caller cancelled a download before every read was submitted.
    #[error("download cancelled after submitting {submitted} of {total} reads")]
    DownloadCancelled {
        /// Reads already handed to the pool.
        submitted: usize,
        /// Reads requested.
        total: usize,
    },

    /// A storage key does not follow the binlog key layout.
    #[error("invalid log path {path:?}: {reason}")]
    InvalidLogPath {
        /// The offending key.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A pooled task panicked or was aborted.
    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl BinlogIoError {
    /// Creates an invalid log path error.
    pub fn invalid_log_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLogPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the operation stopped because the caller cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            BinlogIoError::Cancelled { .. } | BinlogIoError::DownloadCancelled { .. }
        )
    }

    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            BinlogIoError::Storage(e) => e.is_retryable(),
            BinlogIoError::Alloc(AllocError::Unavailable(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_distinct_from_backend_errors() {
        let cancelled = BinlogIoError::Cancelled {
            collection_id: 1,
            segment_id: 2,
        };
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_retryable());

        let storage = BinlogIoError::from(StorageError::transient("a/b", "throttled"));
        assert!(!storage.is_cancelled());
        assert!(storage.is_retryable());

        let missing = BinlogIoError::from(StorageError::not_found("a/b"));
        assert!(!missing.is_retryable());
    }

    #[test]
    fn error_display() {
        let err = BinlogIoError::DownloadCancelled {
            submitted: 2,
            total: 5,
        };
        assert_eq!(
            err.to_string(),
            "download cancelled after submitting 2 of 5 reads"
        );

        let err = BinlogIoError::from(AllocError::Exhausted { ceiling: 10 });
        assert!(err.to_string().contains("exhausted at 10"));
    }
}
