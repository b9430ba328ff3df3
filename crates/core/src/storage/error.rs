//! Error types for the storage module.

use thiserror::Error;

use crate::presign::PresignError;

/// Errors returned by blob store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The key cannot be mapped onto this store.
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// The store answered with a non-success status.
    #[error("Storage returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never got an answer.
    #[error("Storage request failed: {0}")]
    Request(String),

    /// Signing the request failed.
    #[error("Failed to sign storage request: {0}")]
    Signing(#[from] PresignError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Request(e.to_string())
    }
}
