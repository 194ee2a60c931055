//! Result store error types
//!
//! A miss on an explicit read is reported as [`StoreError::NotFound`] so callers can
//! turn it into a cache miss. Every other variant means the store could not be used
//! and the surrounding operation must abort.

use thiserror::Error;

/// Result type for result store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// No object exists at the requested key
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// The key cannot be used as an object path
    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Object storage backend failure (unreachable, access denied, ...)
    #[error("Object storage error: {0}")]
    Backend(#[from] object_store::Error),

    /// Stored bytes are not valid JSON, or a value could not be encoded
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The object exists but does not have the expected structure
    #[error("Unexpected content at '{key}': {reason}")]
    UnexpectedContent { key: String, reason: String },
}

impl StoreError {
    /// Whether this error is a plain miss rather than a store failure.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
