//! Error types for object storage operations.

use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors from the object store or the local filesystem.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Local file could not be read or written.
    #[error("I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// Object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket does not exist.
    #[error("Bucket not found: {bucket}")]
    NoSuchBucket { bucket: String },

    /// Any other failure reported by the store.
    #[error("Storage service error: {message}")]
    Service { message: String },
}

impl StorageError {
    pub(crate) fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn service(err: impl std::fmt::Display) -> Self {
        Self::Service {
            message: err.to_string(),
        }
    }
}
