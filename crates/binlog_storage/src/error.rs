//! Error types for object store operations.

use std::io;
use thiserror::Error;

/// Result type for object store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The requested object does not exist.
    #[error("object not found: {key}")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The backend refused access to the object.
    #[error("permission denied for object: {key}")]
    PermissionDenied {
        /// The key that was accessed.
        key: String,
    },

    /// The key cannot name an object in this store.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// A transient backend failure (throttling, dropped connection, 5xx).
    #[error("transient backend error on {key}: {message}")]
    Transient {
        /// The key being accessed.
        key: String,
        /// Backend error message.
        message: String,
    },

    /// The backend did not answer in time.
    #[error("backend timed out on {key}")]
    Timeout {
        /// The key being accessed.
        key: String,
    },

    /// The store has been shut down.
    #[error("object store is closed")]
    Closed,
}

impl StorageError {
    /// Creates a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a transient backend error.
    pub fn transient(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transient {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns true if repeating the same request may succeed.
    ///
    /// Missing objects, permission failures and malformed keys are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Transient { .. } | StorageError::Timeout { .. } => true,
            StorageError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::Interrupted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            ),
            StorageError::NotFound { .. }
            | StorageError::PermissionDenied { .. }
            | StorageError::InvalidKey { .. }
            | StorageError::Closed => false,
        }
    }

    /// Maps an I/O error raised while accessing `key` to a classified error.
    pub(crate) fn from_io(key: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::not_found(key),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                key: key.to_string(),
            },
            io::ErrorKind::TimedOut => Self::Timeout {
                key: key.to_string(),
            },
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(StorageError::transient("k", "503 SlowDown").is_retryable());
        assert!(StorageError::Timeout { key: "k".into() }.is_retryable());
        assert!(StorageError::Io(io::Error::from(io::ErrorKind::Interrupted)).is_retryable());

        assert!(!StorageError::not_found("k").is_retryable());
        assert!(!StorageError::invalid_key("", "empty").is_retryable());
        assert!(!StorageError::PermissionDenied { key: "k".into() }.is_retryable());
        assert!(!StorageError::Closed.is_retryable());
        assert!(!StorageError::Io(io::Error::from(io::ErrorKind::InvalidData)).is_retryable());
    }

    #[test]
    fn io_errors_are_classified_by_kind() {
        let err = StorageError::from_io("a/b", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, StorageError::NotFound { ref key } if key == "a/b"));

        let err = StorageError::from_io("a/b", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, StorageError::PermissionDenied { .. }));

        let err = StorageError::from_io("a/b", io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn error_display() {
        let err = StorageError::not_found("files/insert_log/1/2/3/4/5");
        assert_eq!(
            err.to_string(),
            "object not found: files/insert_log/1/2/3/4/5"
        );
    }
}
