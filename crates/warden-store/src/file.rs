//! Flat-file implementation of the Store trait.
//!
//! One JSON document per holder under `users/`, `groups/`, and
//! `tracks/`, plus an append-only `actions.log` of JSON lines. Writes
//! go through a temp file and rename so a crash never leaves a
//! half-written snapshot. All filesystem work runs on the blocking
//! thread pool.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use warden_model::UserId;

use crate::error::{Result, StoreError};
use crate::snapshot::{ActionLogEntry, GroupSnapshot, TrackSnapshot, UserSnapshot};
use crate::traits::Store;

const USERS_DIR: &str = "users";
const GROUPS_DIR: &str = "groups";
const TRACKS_DIR: &str = "tracks";
const ACTIONS_FILE: &str = "actions.log";

/// JSON flat-file store rooted at a data directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a flat-file store, creating the directory layout if absent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [USERS_DIR, GROUPS_DIR, TRACKS_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self { root })
    }

    fn user_path(&self, id: UserId) -> PathBuf {
        self.root.join(USERS_DIR).join(format!("{}.json", id))
    }

    fn group_path(&self, name: &str) -> PathBuf {
        self.root.join(GROUPS_DIR).join(format!("{}.json", name))
    }

    fn track_path(&self, name: &str) -> PathBuf {
        self.root.join(TRACKS_DIR).join(format!("{}.json", name))
    }
}

fn join_err(err: tokio::task::JoinError) -> StoreError {
    StoreError::Task(err.to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    // Write-then-rename keeps the visible file whole at all times.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn list_json_stems(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[async_trait]
impl Store for FileStore {
    async fn load_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
        let path = self.user_path(id);
        tokio::task::spawn_blocking(move || read_json(&path))
            .await
            .map_err(join_err)?
    }

    async fn save_user(&self, snapshot: &UserSnapshot) -> Result<()> {
        let path = self.user_path(snapshot.id);
        let snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || write_json(&path, &snapshot))
            .await
            .map_err(join_err)?
    }

    async fn load_group(&self, name: &str) -> Result<Option<GroupSnapshot>> {
        let path = self.group_path(name);
        tokio::task::spawn_blocking(move || read_json(&path))
            .await
            .map_err(join_err)?
    }

    async fn save_group(&self, snapshot: &GroupSnapshot) -> Result<()> {
        let path = self.group_path(&snapshot.name);
        let snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || write_json(&path, &snapshot))
            .await
            .map_err(join_err)?
    }

    async fn delete_group(&self, name: &str) -> Result<()> {
        let path = self.group_path(name);
        tokio::task::spawn_blocking(move || remove_if_present(&path))
            .await
            .map_err(join_err)?
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        let dir = self.root.join(GROUPS_DIR);
        tokio::task::spawn_blocking(move || list_json_stems(&dir))
            .await
            .map_err(join_err)?
    }

    async fn load_track(&self, name: &str) -> Result<Option<TrackSnapshot>> {
        let path = self.track_path(name);
        tokio::task::spawn_blocking(move || read_json(&path))
            .await
            .map_err(join_err)?
    }

    async fn save_track(&self, snapshot: &TrackSnapshot) -> Result<()> {
        let path = self.track_path(&snapshot.name);
        let snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || write_json(&path, &snapshot))
            .await
            .map_err(join_err)?
    }

    async fn delete_track(&self, name: &str) -> Result<()> {
        let path = self.track_path(name);
        tokio::task::spawn_blocking(move || remove_if_present(&path))
            .await
            .map_err(join_err)?
    }

    async fn list_tracks(&self) -> Result<Vec<String>> {
        let dir = self.root.join(TRACKS_DIR);
        tokio::task::spawn_blocking(move || list_json_stems(&dir))
            .await
            .map_err(join_err)?
    }

    async fn log_action(&self, entry: &ActionLogEntry) -> Result<()> {
        let path = self.root.join(ACTIONS_FILE);
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || {
            let line = serde_json::to_string(&entry)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", line)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }
}
