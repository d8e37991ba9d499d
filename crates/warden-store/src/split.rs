//! Split-storage routing.
//!
//! A `SplitStore` routes each data section to its own inner backend, so
//! a deployment can keep users in SQLite while groups live in flat
//! files. With no split configured every section shares one backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use warden_model::UserId;

use crate::error::Result;
use crate::snapshot::{ActionLogEntry, GroupSnapshot, TrackSnapshot, UserSnapshot};
use crate::traits::Store;

/// The routable data sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    User,
    Group,
    Track,
    ActionLog,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::User => "user",
            Section::Group => "group",
            Section::Track => "track",
            Section::ActionLog => "actionlog",
        };
        f.write_str(name)
    }
}

/// Store that routes each section to a possibly distinct backend.
pub struct SplitStore {
    user: Arc<dyn Store>,
    group: Arc<dyn Store>,
    track: Arc<dyn Store>,
    action_log: Arc<dyn Store>,
}

impl SplitStore {
    /// Route every section to the same backend.
    pub fn uniform(backend: Arc<dyn Store>) -> Self {
        Self {
            user: backend.clone(),
            group: backend.clone(),
            track: backend.clone(),
            action_log: backend,
        }
    }

    /// Replace the backend for one section.
    pub fn with_section(mut self, section: Section, backend: Arc<dyn Store>) -> Self {
        match section {
            Section::User => self.user = backend,
            Section::Group => self.group = backend,
            Section::Track => self.track = backend,
            Section::ActionLog => self.action_log = backend,
        }
        self
    }
}

#[async_trait]
impl Store for SplitStore {
    async fn load_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
        self.user.load_user(id).await
    }

    async fn save_user(&self, snapshot: &UserSnapshot) -> Result<()> {
        self.user.save_user(snapshot).await
    }

    async fn load_group(&self, name: &str) -> Result<Option<GroupSnapshot>> {
        self.group.load_group(name).await
    }

    async fn save_group(&self, snapshot: &GroupSnapshot) -> Result<()> {
        self.group.save_group(snapshot).await
    }

    async fn delete_group(&self, name: &str) -> Result<()> {
        self.group.delete_group(name).await
    }

    async fn list_groups(&self) -> Result<Vec<String>> {
        self.group.list_groups().await
    }

    async fn load_track(&self, name: &str) -> Result<Option<TrackSnapshot>> {
        self.track.load_track(name).await
    }

    async fn save_track(&self, snapshot: &TrackSnapshot) -> Result<()> {
        self.track.save_track(snapshot).await
    }

    async fn delete_track(&self, name: &str) -> Result<()> {
        self.track.delete_track(name).await
    }

    async fn list_tracks(&self) -> Result<Vec<String>> {
        self.track.list_tracks().await
    }

    async fn log_action(&self, entry: &ActionLogEntry) -> Result<()> {
        self.action_log.log_action(entry).await
    }
}
