//! Error types for the model layer.

use thiserror::Error;

/// Errors raised by holder, track, and registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A referenced group does not exist in the registry.
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// A group with this name is already registered.
    #[error("group already exists: {0}")]
    GroupExists(String),

    /// A track with this name is already registered.
    #[error("track already exists: {0}")]
    TrackExists(String),

    /// A track does not contain the named group.
    #[error("track {track} does not contain group {group}")]
    NotOnTrack { track: String, group: String },

    /// A track already contains the named group.
    #[error("track {track} already contains group {group}")]
    AlreadyOnTrack { track: String, group: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
