//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Each holder is
//! one row; the node list is stored as a CBOR blob.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use warden_model::UserId;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::snapshot::{ActionLogEntry, GroupSnapshot, NodeRecord, TrackSnapshot, UserSnapshot};
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Task("connection mutex poisoned".to_string()))
}

fn join_err(err: tokio::task::JoinError) -> StoreError {
    StoreError::Task(err.to_string())
}

fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let row: Option<(Option<String>, String, Vec<u8>)> = conn
                .query_row(
                    "SELECT username, primary_group, nodes FROM users WHERE id = ?1",
                    params![id.to_string()],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((username, primary_group, nodes_cbor)) = row else {
                return Ok(None);
            };

            let nodes: Vec<NodeRecord> = decode_cbor(&nodes_cbor)?;
            Ok(Some(UserSnapshot {
                id,
                username,
                primary_group,
                nodes,
            }))
        })
        .await
        .map_err(join_err)?
    }

    async fn save_user(&self, snapshot: &UserSnapshot) -> Result<()> {
        let snapshot = snapshot.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let nodes_cbor = encode_cbor(&snapshot.nodes)?;
            let conn = lock(&conn)?;

            conn.execute(
                "INSERT INTO users (id, username, primary_group, nodes)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    username = excluded.username,
                    primary_group = excluded.primary_group,
                    nodes = excluded.nodes",
                params![
                    snapshot.id.to_string(),
                    snapshot.username,
                    snapshot.primary_group,
                    nodes_cbor,
                ],
            )?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn load_group(&self, name: &str) -> Result<Option<GroupSnapshot>> {
        let name = name.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let nodes_cbor: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT nodes FROM groups WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(nodes_cbor) = nodes_cbor else {
                return Ok(None);
            };

            let nodes: Vec<NodeRecord> = decode_cbor(&nodes_cbor)?;
            Ok(Some(GroupSnapshot { name, nodes }))
        })
        .await
        .map_err(join_err)?
    }

    async fn save_group(&self, snapshot: &GroupSnapshot) -> Result<()> {
        let snapshot = snapshot.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let nodes_cbor = encode_cbor(&snapshot.nodes)?;
            let conn = lock(&conn)?;

            conn.execute(
                "INSERT INTO groups (name, nodes) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET nodes = excluded.nodes",
                params![snapshot.name, nodes_cbor],
            )?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn delete_group(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute("DELETE FROM groups WHERE name = ?1", params![name])?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare("SELECT name FROM groups ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;

            Ok(names)
        })
        .await
        .map_err(join_err)?
    }

    async fn load_track(&self, name: &str) -> Result<Option<TrackSnapshot>> {
        let name = name.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let groups_cbor: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT groups FROM tracks WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(groups_cbor) = groups_cbor else {
                return Ok(None);
            };

            let groups: Vec<String> = decode_cbor(&groups_cbor)?;
            Ok(Some(TrackSnapshot { name, groups }))
        })
        .await
        .map_err(join_err)?
    }

    async fn save_track(&self, snapshot: &TrackSnapshot) -> Result<()> {
        let snapshot = snapshot.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let groups_cbor = encode_cbor(&snapshot.groups)?;
            let conn = lock(&conn)?;

            conn.execute(
                "INSERT INTO tracks (name, groups) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET groups = excluded.groups",
                params![snapshot.name, groups_cbor],
            )?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn delete_track(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute("DELETE FROM tracks WHERE name = ?1", params![name])?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn list_tracks(&self) -> Result<Vec<String>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare("SELECT name FROM tracks ORDER BY name")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;

            Ok(names)
        })
        .await
        .map_err(join_err)?
    }

    async fn log_action(&self, entry: &ActionLogEntry) -> Result<()> {
        let entry = entry.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            conn.execute(
                "INSERT INTO actions (timestamp, actor, actor_name, acted, acted_name, action)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.timestamp,
                    entry.actor.map(|id| id.to_string()),
                    entry.actor_name,
                    entry.acted,
                    entry.acted_name,
                    entry.action,
                ],
            )?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::ContextSet;

    fn user_snapshot(id: UserId) -> UserSnapshot {
        UserSnapshot {
            id,
            username: Some("alice".to_string()),
            primary_group: "admin".to_string(),
            nodes: vec![
                NodeRecord {
                    key: "perms.fly".to_string(),
                    value: true,
                    contexts: ContextSet::singleton("world", "nether"),
                    expiry: None,
                },
                NodeRecord {
                    key: "group.admin".to_string(),
                    value: true,
                    contexts: ContextSet::empty(),
                    expiry: Some(5_000),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_user_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let id = UserId::random();
        let snapshot = user_snapshot(id);

        assert!(store.load_user(id).await.unwrap().is_none());
        store.save_user(&snapshot).await.unwrap();
        assert_eq!(store.load_user(id).await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_save_user_overwrites() {
        let store = SqliteStore::open_memory().unwrap();
        let id = UserId::random();
        let mut snapshot = user_snapshot(id);
        store.save_user(&snapshot).await.unwrap();

        snapshot.nodes.pop();
        snapshot.username = Some("renamed".to_string());
        store.save_user(&snapshot).await.unwrap();

        let loaded = store.load_user(id).await.unwrap().unwrap();
        assert_eq!(loaded.username.as_deref(), Some("renamed"));
        assert_eq!(loaded.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let store = SqliteStore::open_memory().unwrap();

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
        store.delete_group("admin").await.unwrap();
    }

    #[tokio::test]
    async fn test_track_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let track = TrackSnapshot {
            name: "staff".to_string(),
            groups: vec!["member".to_string(), "admin".to_string()],
        };

        store.save_track(&track).await.unwrap();
        assert_eq!(store.load_track("staff").await.unwrap(), Some(track));
        assert_eq!(store.list_tracks().await.unwrap(), vec!["staff"]);
    }

    #[tokio::test]
    async fn test_action_log_write() {
        let store = SqliteStore::open_memory().unwrap();
        store
            .log_action(&ActionLogEntry {
                timestamp: 1_000,
                actor: Some(UserId::random()),
                actor_name: "alice".to_string(),
                acted: "admin".to_string(),
                acted_name: "admin".to_string(),
                action: "permission set perms.fly true".to_string(),
            })
            .await
            .unwrap();
    }
}
