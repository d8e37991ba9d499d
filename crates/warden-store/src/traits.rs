//! Store trait: the abstract interface for holder persistence.
//!
//! This trait keeps the engine storage-agnostic. Implementations include
//! SQLite (primary), a JSON flat-file backend, and in-memory (for tests).

use async_trait::async_trait;

use warden_model::UserId;

use crate::error::Result;
use crate::snapshot::{ActionLogEntry, GroupSnapshot, TrackSnapshot, UserSnapshot};

/// The Store trait: async interface for holder persistence.
///
/// All methods are async to support both sync (SQLite, files) and async
/// backends. Sync backends use `spawn_blocking` internally to avoid
/// blocking the runtime.
///
/// # Design Notes
///
/// - **Whole-holder writes**: a save replaces the holder's entire
///   persisted node list; there are no per-node mutations.
/// - **Absent is not an error**: loading an unknown id returns
///   `Ok(None)`.
/// - **Append-only audit**: `log_action` only writes; nothing reads the
///   log back through this interface.
#[async_trait]
pub trait Store: Send + Sync {
    /// Load a user snapshot, if one is persisted.
    async fn load_user(&self, id: UserId) -> Result<Option<UserSnapshot>>;

    /// Persist a user, replacing any existing snapshot.
    async fn save_user(&self, snapshot: &UserSnapshot) -> Result<()>;

    /// Load a group snapshot, if one is persisted.
    async fn load_group(&self, name: &str) -> Result<Option<GroupSnapshot>>;

    /// Persist a group, replacing any existing snapshot.
    async fn save_group(&self, snapshot: &GroupSnapshot) -> Result<()>;

    /// Delete a group. Deleting an absent group is not an error.
    async fn delete_group(&self, name: &str) -> Result<()>;

    /// Names of all persisted groups.
    async fn list_groups(&self) -> Result<Vec<String>>;

    /// Load a track snapshot, if one is persisted.
    async fn load_track(&self, name: &str) -> Result<Option<TrackSnapshot>>;

    /// Persist a track, replacing any existing snapshot.
    async fn save_track(&self, snapshot: &TrackSnapshot) -> Result<()>;

    /// Delete a track. Deleting an absent track is not an error.
    async fn delete_track(&self, name: &str) -> Result<()>;

    /// Names of all persisted tracks.
    async fn list_tracks(&self) -> Result<Vec<String>>;

    /// Append one entry to the audit log.
    async fn log_action(&self, entry: &ActionLogEntry) -> Result<()>;
}
