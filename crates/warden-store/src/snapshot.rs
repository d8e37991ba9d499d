//! Serialized holder state.
//!
//! Snapshots are the persisted form of users, groups, and tracks: plain
//! serde structs carrying the ordered node list plus holder metadata.
//! The same snapshot types feed every backend; only the encoding (JSON
//! file, CBOR blob in SQLite, in-memory map) differs.

use serde::{Deserialize, Serialize};

use warden_core::{ContextSet, Node};
use warden_model::{Group, PermissionHolder, Track, User, UserId};

use crate::error::Result;

/// One persisted node. Kind is not stored; it is re-derived from the key
/// on load, so the stored layout stays stable across kind changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub key: String,
    pub value: bool,
    #[serde(default, skip_serializing_if = "ContextSet::is_empty")]
    pub contexts: ContextSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl NodeRecord {
    pub fn from_node(node: &Node) -> Self {
        Self {
            key: node.key().to_string(),
            value: node.value(),
            contexts: node.contexts().clone(),
            expiry: node.expiry(),
        }
    }

    pub fn into_node(self) -> Result<Node> {
        Ok(Node::new(self.key, self.value, self.contexts, self.expiry)?)
    }
}

fn records_of(holder: &PermissionHolder) -> Vec<NodeRecord> {
    holder
        .entries()
        .iter()
        .map(|e| NodeRecord::from_node(&e.node))
        .collect()
}

fn holder_of(nodes: Vec<NodeRecord>) -> Result<PermissionHolder> {
    let nodes = nodes
        .into_iter()
        .map(NodeRecord::into_node)
        .collect::<Result<Vec<_>>>()?;
    Ok(PermissionHolder::from_nodes(nodes))
}

/// Persisted form of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub primary_group: String,
    pub nodes: Vec<NodeRecord>,
}

impl UserSnapshot {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id(),
            username: user.username().map(str::to_string),
            primary_group: user.primary_group().to_string(),
            nodes: records_of(user.holder()),
        }
    }

    pub fn into_user(self) -> Result<User> {
        Ok(User::with_holder(
            self.id,
            self.username,
            self.primary_group,
            holder_of(self.nodes)?,
        ))
    }
}

/// Persisted form of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub nodes: Vec<NodeRecord>,
}

impl GroupSnapshot {
    pub fn from_group(group: &Group) -> Self {
        Self {
            name: group.name().to_string(),
            nodes: records_of(group.holder()),
        }
    }

    pub fn into_group(self) -> Result<Group> {
        Ok(Group::with_holder(self.name, holder_of(self.nodes)?))
    }
}

/// Persisted form of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub name: String,
    pub groups: Vec<String>,
}

impl TrackSnapshot {
    pub fn from_track(track: &Track) -> Self {
        Self {
            name: track.name().to_string(),
            groups: track.groups().to_vec(),
        }
    }

    pub fn into_track(self) -> Track {
        Track::with_groups(self.name, self.groups)
    }
}

/// One audit record. Write-only: the engine appends, nothing reads back
/// through the store interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// When the action happened (Unix ms).
    pub timestamp: i64,
    /// The acting subject's id, if one exists (console actions have none).
    pub actor: Option<UserId>,
    pub actor_name: String,
    /// Identifier of the subject acted upon (user id or group name).
    pub acted: String,
    pub acted_name: String,
    /// Human-readable description of what was done.
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_snapshot_roundtrip() {
        let mut user = User::new(UserId::random(), Some("alice".to_string()));
        user.set_primary_group("admin");
        user.holder_mut().set_permission(
            Node::permission("perms.fly")
                .with_context("world", "nether")
                .build()
                .unwrap(),
            0,
        );
        user.holder_mut()
            .set_permission(Node::group("admin").expiry(5_000).build().unwrap(), 0);

        let snapshot = UserSnapshot::from_user(&user);
        let restored = snapshot.clone().into_user().unwrap();

        assert_eq!(restored.id(), user.id());
        assert_eq!(restored.username(), Some("alice"));
        assert_eq!(restored.primary_group(), "admin");
        assert_eq!(
            UserSnapshot::from_user(&restored).nodes,
            snapshot.nodes
        );
        // Loaded holders start clean.
        assert!(!restored.holder().is_dirty());
    }

    #[test]
    fn test_node_record_json_shape() {
        let node = Node::permission("perms.fly").build().unwrap();
        let record = NodeRecord::from_node(&node);
        let json = serde_json::to_value(&record).unwrap();

        // Permanent global nodes serialize without optional fields.
        assert_eq!(
            json,
            serde_json::json!({"key": "perms.fly", "value": true})
        );
    }

    #[test]
    fn test_group_snapshot_rederives_kind() {
        let mut group = Group::new("admin");
        group
            .holder_mut()
            .set_permission(Node::weight(10).build().unwrap(), 0);

        let restored = GroupSnapshot::from_group(&group).into_group().unwrap();
        assert_eq!(restored.weight(), Some(10));
    }
}
