//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O error from the flat-file backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored node failed to reconstruct.
    #[error("invalid stored node: {0}")]
    InvalidNode(#[from] warden_core::CoreError),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A background storage task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
