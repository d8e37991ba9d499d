//! In-memory registries for loaded holders.
//!
//! Registries are process-wide shared state: read on every resolution
//! call from any thread, mutated when holders are loaded or evicted.
//! They are explicitly owned by the engine instance, never globals.
//! Each holder lives behind its own `RwLock`, serializing its mutations
//! while letting resolution take consistent read snapshots.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::group::Group;
use crate::track::Track;
use crate::user::{User, UserId};

/// Shared handle to a loaded user.
pub type UserRef = Arc<RwLock<User>>;

/// Shared handle to a loaded group.
pub type GroupRef = Arc<RwLock<Group>>;

/// Shared handle to a loaded track.
pub type TrackRef = Arc<RwLock<Track>>;

/// Registry of loaded users. Users may be evicted when the subject
/// disconnects from the host.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<UserId, UserRef>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: UserId) -> Option<UserRef> {
        self.users.read().unwrap().get(&id).cloned()
    }

    /// Insert a loaded user, returning the shared handle. An existing
    /// entry for the same id is replaced.
    pub fn insert(&self, user: User) -> UserRef {
        let id = user.id();
        let handle = Arc::new(RwLock::new(user));
        self.users.write().unwrap().insert(id, handle.clone());
        handle
    }

    /// Evict a user from memory. The handle stays valid for holders of
    /// outstanding references; the registry just forgets it.
    pub fn evict(&self, id: UserId) -> Option<UserRef> {
        self.users.write().unwrap().remove(&id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.users.read().unwrap().contains_key(&id)
    }

    pub fn ids(&self) -> Vec<UserId> {
        self.users.read().unwrap().keys().copied().collect()
    }

    /// Snapshot of all loaded user handles.
    pub fn all(&self) -> Vec<UserRef> {
        self.users.read().unwrap().values().cloned().collect()
    }
}

/// Registry of loaded groups. Groups are long-lived for the process
/// lifetime; the registry starts empty and is populated by storage
/// loads.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, GroupRef>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<GroupRef> {
        self.groups.read().unwrap().get(name).cloned()
    }

    pub fn insert(&self, group: Group) -> GroupRef {
        let name = group.name().to_string();
        let handle = Arc::new(RwLock::new(group));
        self.groups.write().unwrap().insert(name, handle.clone());
        handle
    }

    pub fn remove(&self, name: &str) -> Option<GroupRef> {
        self.groups.write().unwrap().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.read().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.read().unwrap().keys().cloned().collect()
    }

    pub fn all(&self) -> Vec<GroupRef> {
        self.groups.read().unwrap().values().cloned().collect()
    }
}

/// Registry of loaded tracks.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: RwLock<HashMap<String, TrackRef>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<TrackRef> {
        self.tracks.read().unwrap().get(name).cloned()
    }

    pub fn insert(&self, track: Track) -> TrackRef {
        let name = track.name().to_string();
        let handle = Arc::new(RwLock::new(track));
        self.tracks.write().unwrap().insert(name, handle.clone());
        handle
    }

    pub fn remove(&self, name: &str) -> Option<TrackRef> {
        self.tracks.write().unwrap().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tracks.read().unwrap().keys().cloned().collect()
    }
}
