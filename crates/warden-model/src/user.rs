//! User holders.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::holder::PermissionHolder;

/// Stable unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random id (tests and offline-mode subjects).
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user: identified by a stable id plus a cached display name.
///
/// Users are created on first load from storage or on first access for a
/// never-before-seen subject, and may be evicted from the registry when
/// the subject disconnects.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    username: Option<String>,
    primary_group: String,
    holder: PermissionHolder,
}

impl User {
    /// Create a brand-new user with an empty node set.
    pub fn new(id: UserId, username: Option<String>) -> Self {
        Self {
            id,
            username,
            primary_group: "default".to_string(),
            holder: PermissionHolder::new(),
        }
    }

    /// Rebuild a user from loaded state.
    pub fn with_holder(
        id: UserId,
        username: Option<String>,
        primary_group: String,
        holder: PermissionHolder,
    ) -> Self {
        Self {
            id,
            username,
            primary_group,
            holder,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Update the cached display name. Returns true if it changed.
    pub fn set_username(&mut self, username: Option<String>) -> bool {
        if self.username != username {
            self.username = username;
            self.holder.mark_dirty();
            true
        } else {
            false
        }
    }

    pub fn primary_group(&self) -> &str {
        &self.primary_group
    }

    pub fn set_primary_group(&mut self, group: impl Into<String>) {
        self.primary_group = group.into();
        self.holder.mark_dirty();
    }

    /// The name shown in messages: username if known, else the id.
    pub fn friendly_name(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn holder(&self) -> &PermissionHolder {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut PermissionHolder {
        &mut self.holder
    }
}
