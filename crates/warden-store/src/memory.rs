//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use warden_model::UserId;

use crate::error::Result;
use crate::snapshot::{ActionLogEntry, GroupSnapshot, TrackSnapshot, UserSnapshot};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<UserId, UserSnapshot>,
    groups: HashMap<String, GroupSnapshot>,
    tracks: HashMap<String, TrackSnapshot>,
    actions: Vec<ActionLogEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the audit log, for assertions in tests.
    pub fn actions(&self) -> Vec<ActionLogEntry> {
        self.inner.read().unwrap().actions.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
        Ok(self.inner.read().unwrap().users.get(&id).cloned())
    }

    async fn save_user(&self, snapshot: &UserSnapshot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.users.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    async fn load_group(&self, name: &str) -> Result<Option<GroupSnapshot>> {
        Ok(self.inner.read().unwrap().groups.get(name).cloned())
    }

    async fn save_group(&self, snapshot: &GroupSnapshot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.groups.insert(snapshot.name.clone(), snapshot.clone());
        Ok(())
    }

    async fn delete_group(&self, name: &str) -> Result<()> {
        self.inner.write().unwrap().groups.remove(name);
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> =
            self.inner.read().unwrap().groups.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn load_track(&self, name: &str) -> Result<Option<TrackSnapshot>> {
        Ok(self.inner.read().unwrap().tracks.get(name).cloned())
    }

    async fn save_track(&self, snapshot: &TrackSnapshot) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.tracks.insert(snapshot.name.clone(), snapshot.clone());
        Ok(())
    }

    async fn delete_track(&self, name: &str) -> Result<()> {
        self.inner.write().unwrap().tracks.remove(name);
        Ok(())
    }

    async fn list_tracks(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> =
            self.inner.read().unwrap().tracks.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn log_action(&self, entry: &ActionLogEntry) -> Result<()> {
        self.inner.write().unwrap().actions.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::NodeRecord;
    use warden_core::ContextSet;

    fn user_snapshot() -> UserSnapshot {
        UserSnapshot {
            id: UserId::random(),
            username: Some("alice".to_string()),
            primary_group: "default".to_string(),
            nodes: vec![NodeRecord {
                key: "perms.fly".to_string(),
                value: true,
                contexts: ContextSet::empty(),
                expiry: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_user_save_load() {
        let store = MemoryStore::new();
        let snapshot = user_snapshot();

        assert!(store.load_user(snapshot.id).await.unwrap().is_none());
        store.save_user(&snapshot).await.unwrap();
        assert_eq!(store.load_user(snapshot.id).await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let store = MemoryStore::new();
        store
            .save_group(&GroupSnapshot {
                name: "admin".to_string(),
                nodes: vec![],
            })
            .await
            .unwrap();
        store
            .save_group(&GroupSnapshot {
                name: "default".to_string(),
                nodes: vec![],
            })
            .await
            .unwrap();

        assert_eq!(store.list_groups().await.unwrap(), vec!["admin", "default"]);

        store.delete_group("admin").await.unwrap();
        assert_eq!(store.list_groups().await.unwrap(), vec!["default"]);
        // Deleting again is a no-op.
        store.delete_group("admin").await.unwrap();
    }

    #[tokio::test]
    async fn test_action_log_appends() {
        let store = MemoryStore::new();
        let entry = ActionLogEntry {
            timestamp: 1_000,
            actor: None,
            actor_name: "console".to_string(),
            acted: "admin".to_string(),
            acted_name: "admin".to_string(),
            action: "permission set perms.fly true".to_string(),
        };

        store.log_action(&entry).await.unwrap();
        store.log_action(&entry).await.unwrap();
        assert_eq!(store.actions().len(), 2);
    }
}
