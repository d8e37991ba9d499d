//! Error types for the Warden core.

use thiserror::Error;

/// Errors raised while building or parsing permission nodes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("node string has an empty key")]
    EmptyKey,

    #[error("node string ends with a dangling escape character")]
    DanglingEscape,

    #[error("node string has an empty segment at position {0}")]
    EmptySegment(usize),

    #[error("missing value for {kind} node: {raw}")]
    MissingValue { kind: &'static str, raw: String },

    #[error("invalid priority for {kind} node: {value}")]
    InvalidPriority { kind: &'static str, value: String },

    #[error("invalid weight value: {0}")]
    InvalidWeight(String),

    #[error("invalid shorthand group in {0}")]
    InvalidShorthand(String),

    #[error("malformed node: {0}")]
    MalformedNode(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
