//! Merge policy for temporary nodes.

use serde::{Deserialize, Serialize};

/// How a new temporary node interacts with an existing temporary node
/// sharing the same key and context set.
///
/// This is process-wide configuration, not per-node state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporaryMergeBehaviour {
    /// Reject the new node and signal an already-exists condition.
    #[default]
    Deny,
    /// Overwrite the existing node, discarding its expiry.
    Replace,
    /// Keep one node and extend its expiry by the new duration.
    Accumulate,
}

impl TemporaryMergeBehaviour {
    /// Parse a configuration string. Unrecognized values fall back to
    /// the default (`Deny`), matching lenient config handling.
    pub fn from_config(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "replace" => TemporaryMergeBehaviour::Replace,
            "accumulate" => TemporaryMergeBehaviour::Accumulate,
            _ => TemporaryMergeBehaviour::Deny,
        }
    }
}
