//! Error types for quotekeeper.
//!
//! None of these are fatal: every operation returns them to the caller, which
//! decides how to surface them.

use thiserror::Error;

/// Result type alias for quote operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Main error type for quote operations
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage operation failed: {0}")]
    StorageOperation(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Import parse error: {0}")]
    ImportParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl QuoteError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QuoteError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new sync error
    pub fn sync(message: impl Into<String>) -> Self {
        QuoteError::Sync(message.into())
    }

    /// Create a new import parse error
    pub fn import_parse(message: impl Into<String>) -> Self {
        QuoteError::ImportParse(message.into())
    }

    /// Create a new storage operation error
    pub fn storage_op(message: impl Into<String>) -> Self {
        QuoteError::StorageOperation(message.into())
    }

    /// True for errors raised while talking to the remote source
    pub fn is_sync_error(&self) -> bool {
        matches!(self, QuoteError::Sync(_) | QuoteError::Network(_))
    }
}
