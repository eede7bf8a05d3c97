//! Storage errors shared by every backend and both engines.

use thiserror::Error;

/// Errors that can occur while talking to a storage backend.
///
/// The expiration engines never wrap these: whatever a backend returns is
/// exactly what the caller of the engine sees.
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error (reading or writing a backing file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    Poisoned,

    /// Any other failure reported by a custom backend
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl StorageError {
    /// Wraps an arbitrary error raised by a custom backend.
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        StorageError::Backend(err.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::Poisoned
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
