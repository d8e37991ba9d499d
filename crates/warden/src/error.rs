//! Error types for the engine.

use thiserror::Error;

use warden_core::CoreError;
use warden_model::ModelError;
use warden_store::StoreError;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Node parse or validation error.
    #[error("node error: {0}")]
    Node(#[from] CoreError),

    /// Model error (unknown group, duplicate track, ...).
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A configuration key outside the recognized table was requested.
    #[error("unknown config key: {0}")]
    UnknownConfigKey(String),

    /// The group is required by the engine and cannot be deleted.
    #[error("group {0} is protected")]
    ProtectedGroup(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
