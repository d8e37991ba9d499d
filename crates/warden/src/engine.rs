//! The Engine: unified API for the warden permission system.
//!
//! The engine ties registries, configuration, and storage together into
//! a cohesive interface for the embedding host. All shared state lives
//! behind one `Arc`, so clones are cheap handles onto the same engine.

use std::sync::Arc;

use tracing::{debug, warn};

use warden_core::{ContextSet, Node, Tristate};
use warden_model::{
    Group, GroupRef, GroupRegistry, ModelError, Resolver, Track, TrackRef, TrackRegistry, User,
    UserId, UserRef, UserRegistry,
};
use warden_store::{
    ActionLogEntry, GroupSnapshot, Store, TrackSnapshot, UserSnapshot,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::saving::{SaveCoalescer, SaveKey};

/// The group every never-seen user starts in. It always exists and
/// cannot be deleted.
pub const DEFAULT_GROUP: &str = "default";

struct Inner<S> {
    store: Arc<S>,
    config: EngineConfig,
    users: UserRegistry,
    groups: GroupRegistry,
    tracks: TrackRegistry,
    saves: SaveCoalescer,
}

/// The main engine struct.
///
/// Provides a unified API for:
/// - Loading and evicting users
/// - Managing groups and tracks
/// - Resolving permissions and meta
/// - Coalesced background persistence
pub struct Engine<S: Store> {
    inner: Arc<Inner<S>>,
}

impl<S: Store> Clone for Engine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Store + 'static> Engine<S> {
    /// Create a new engine instance over a storage backend.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Arc::new(store),
                config,
                users: UserRegistry::new(),
                groups: GroupRegistry::new(),
                tracks: TrackRegistry::new(),
                saves: SaveCoalescer::new(),
            }),
        }
    }

    /// Load persisted groups and tracks and guarantee the default group
    /// exists. Called once at startup.
    pub async fn init(&self) -> Result<()> {
        for name in self.inner.store.list_groups().await? {
            if let Some(snapshot) = self.inner.store.load_group(&name).await? {
                self.inner.groups.insert(snapshot.into_group()?);
            }
        }

        for name in self.inner.store.list_tracks().await? {
            if let Some(snapshot) = self.inner.store.load_track(&name).await? {
                self.inner.tracks.insert(snapshot.into_track());
            }
        }

        if !self.inner.groups.contains(DEFAULT_GROUP) {
            let group = Group::new(DEFAULT_GROUP);
            self.inner
                .store
                .save_group(&GroupSnapshot::from_group(&group))
                .await?;
            self.inner.groups.insert(group);
            debug!(group = DEFAULT_GROUP, "created default group");
        }

        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.inner.groups
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a loaded user, or load it from storage, or create a fresh
    /// default user for a never-seen id.
    pub async fn get_or_load_user(
        &self,
        id: UserId,
        username: Option<String>,
    ) -> Result<UserRef> {
        if let Some(handle) = self.inner.users.get(id) {
            self.refresh_username(&handle, username);
            return Ok(handle);
        }

        let user = match self.inner.store.load_user(id).await? {
            Some(snapshot) => {
                let mut user = snapshot.into_user()?;
                if username.is_some() && user.set_username(username.clone()) {
                    debug!(%id, "updated cached username");
                }
                user
            }
            None => {
                // First sighting: membership in the default group only.
                let mut user = User::new(id, username);
                user.holder_mut()
                    .set_permission(Node::group(DEFAULT_GROUP).build()?, now_millis());
                user.holder_mut().mark_clean();
                self.inner
                    .store
                    .save_user(&UserSnapshot::from_user(&user))
                    .await?;
                user
            }
        };

        Ok(self.inner.users.insert(user))
    }

    /// Get a user only if already loaded.
    pub fn get_user(&self, id: UserId) -> Option<UserRef> {
        self.inner.users.get(id)
    }

    /// Evict a user from memory, persisting unsaved changes first.
    ///
    /// The write claims the user's save slot like any queued save, so
    /// at most one write per holder is ever outstanding even when the
    /// eviction races a background save.
    pub fn unload_user(&self, id: UserId) {
        let Some(handle) = self.inner.users.evict(id) else {
            return;
        };
        if !handle.read().unwrap().holder().is_dirty() {
            return;
        }

        let key = SaveKey::User(id);
        let engine = self.clone();
        tokio::spawn(async move {
            // The registry entry is gone, so an in-flight save loop can
            // no longer see this user; wait for it to drain, then write
            // off the handle we still hold.
            while !engine.inner.saves.begin(&key) {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            loop {
                let snapshot = {
                    let mut user = handle.write().unwrap();
                    user.holder_mut().mark_clean();
                    UserSnapshot::from_user(&user)
                };
                if let Err(err) = engine.inner.store.save_user(&snapshot).await {
                    warn!(%err, "failed to persist evicted user");
                }
                if !engine.inner.saves.finish(&key) {
                    break;
                }
            }
        });
    }

    fn refresh_username(&self, handle: &UserRef, username: Option<String>) {
        if username.is_none() {
            return;
        }
        let changed = handle.write().unwrap().set_username(username);
        if changed {
            self.queue_save(SaveKey::User(handle.read().unwrap().id()));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Group Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_group(&self, name: &str) -> Option<GroupRef> {
        self.inner.groups.get(name)
    }

    /// Create a new empty group and persist it.
    pub async fn create_group(&self, name: &str) -> Result<GroupRef> {
        if self.inner.groups.contains(name) {
            return Err(ModelError::GroupExists(name.to_string()).into());
        }

        let group = Group::new(name);
        self.inner
            .store
            .save_group(&GroupSnapshot::from_group(&group))
            .await?;
        Ok(self.inner.groups.insert(group))
    }

    /// Delete a group from the registry and storage.
    pub async fn delete_group(&self, name: &str) -> Result<()> {
        if name == DEFAULT_GROUP {
            return Err(EngineError::ProtectedGroup(name.to_string()));
        }

        self.inner.store.delete_group(name).await?;
        self.inner.groups.remove(name);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Track Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_track(&self, name: &str) -> Option<TrackRef> {
        self.inner.tracks.get(name)
    }

    /// Create a new track over an ordered group list and persist it.
    pub async fn create_track(&self, name: &str, groups: Vec<String>) -> Result<TrackRef> {
        if self.inner.tracks.get(name).is_some() {
            return Err(ModelError::TrackExists(name.to_string()).into());
        }

        let track = Track::with_groups(name, groups);
        self.inner
            .store
            .save_track(&TrackSnapshot::from_track(&track))
            .await?;
        Ok(self.inner.tracks.insert(track))
    }

    pub async fn delete_track(&self, name: &str) -> Result<()> {
        self.inner.store.delete_track(name).await?;
        self.inner.tracks.remove(name);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Effective tristate for a permission on a loaded user.
    pub fn check_permission(&self, user: &UserRef, key: &str, ctx: &ContextSet) -> Tristate {
        let resolver = Resolver::new(
            self.inner.config.resolver_settings(),
            &self.inner.groups,
        );
        let user = user.read().unwrap();
        resolver.resolve_permission(user.holder(), key, ctx, now_millis())
    }

    /// Effective tristate for a permission on a loaded group.
    pub fn check_group_permission(
        &self,
        group: &GroupRef,
        key: &str,
        ctx: &ContextSet,
    ) -> Tristate {
        let resolver = Resolver::new(
            self.inner.config.resolver_settings(),
            &self.inner.groups,
        );
        let group = group.read().unwrap();
        resolver.resolve_permission(group.holder(), key, ctx, now_millis())
    }

    /// Effective value for one meta key on a loaded user.
    pub fn user_meta(&self, user: &UserRef, meta_key: &str, ctx: &ContextSet) -> Option<String> {
        let resolver = Resolver::new(
            self.inner.config.resolver_settings(),
            &self.inner.groups,
        );
        let user = user.read().unwrap();
        resolver.resolve_meta(user.holder(), meta_key, ctx, now_millis())
    }

    /// Full effective meta map on a loaded user.
    pub fn user_effective_meta(
        &self,
        user: &UserRef,
        ctx: &ContextSet,
    ) -> std::collections::BTreeMap<String, String> {
        let resolver = Resolver::new(
            self.inner.config.resolver_settings(),
            &self.inner.groups,
        );
        let user = user.read().unwrap();
        resolver.effective_meta(user.holder(), ctx, now_millis())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────────────────────

    /// Queue a background save for a holder. At most one save per
    /// holder runs at a time; requests made while one runs coalesce
    /// into a single follow-up write.
    pub fn queue_save(&self, key: SaveKey) {
        if !self.inner.saves.begin(&key) {
            debug!(?key, "save already in flight; coalesced");
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = engine.save_now(&key).await {
                    warn!(?key, %err, "background save failed");
                }
                if !engine.inner.saves.finish(&key) {
                    break;
                }
            }
        });
    }

    /// Persist one holder immediately, marking it clean first so
    /// mutations racing the write re-dirty it.
    async fn save_now(&self, key: &SaveKey) -> Result<()> {
        match key {
            SaveKey::User(id) => {
                let Some(handle) = self.inner.users.get(*id) else {
                    return Ok(());
                };
                let snapshot = {
                    let mut user = handle.write().unwrap();
                    user.holder_mut().mark_clean();
                    UserSnapshot::from_user(&user)
                };
                self.inner.store.save_user(&snapshot).await?;
            }
            SaveKey::Group(name) => {
                let Some(handle) = self.inner.groups.get(name) else {
                    return Ok(());
                };
                let snapshot = {
                    let mut group = handle.write().unwrap();
                    group.holder_mut().mark_clean();
                    GroupSnapshot::from_group(&group)
                };
                self.inner.store.save_group(&snapshot).await?;
            }
            SaveKey::Track(name) => {
                let Some(handle) = self.inner.tracks.get(name) else {
                    return Ok(());
                };
                let snapshot = TrackSnapshot::from_track(&handle.read().unwrap());
                self.inner.store.save_track(&snapshot).await?;
            }
        }
        Ok(())
    }

    /// Persist every dirty loaded holder. Called on shutdown.
    pub async fn flush(&self) -> Result<()> {
        for handle in self.inner.users.all() {
            let id = handle.read().unwrap().id();
            if handle.read().unwrap().holder().is_dirty() {
                self.save_now(&SaveKey::User(id)).await?;
            }
        }
        for handle in self.inner.groups.all() {
            let name = handle.read().unwrap().name().to_string();
            if handle.read().unwrap().holder().is_dirty() {
                self.save_now(&SaveKey::Group(name)).await?;
            }
        }
        Ok(())
    }

    /// Append an audit entry in the background.
    pub fn submit_action(&self, entry: ActionLogEntry) {
        let store = self.inner.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.log_action(&entry).await {
                warn!(%err, "failed to write action log entry");
            }
        });
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_store::MemoryStore;

    async fn engine() -> Engine<MemoryStore> {
        let engine = Engine::new(MemoryStore::new(), EngineConfig::default());
        engine.init().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_init_creates_default_group() {
        let engine = engine().await;
        assert!(engine.get_group(DEFAULT_GROUP).is_some());
        assert_eq!(
            engine.store().load_group(DEFAULT_GROUP).await.unwrap().map(|g| g.name),
            Some(DEFAULT_GROUP.to_string())
        );
    }

    #[tokio::test]
    async fn test_never_seen_user_gets_default_membership() {
        let engine = engine().await;
        let id = UserId::random();

        let user = engine
            .get_or_load_user(id, Some("alice".to_string()))
            .await
            .unwrap();

        assert_eq!(
            engine.check_permission(&user, "group.default", &ContextSet::empty()),
            Tristate::True
        );
        // The fresh user was persisted.
        assert!(engine.store().load_user(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_default_group_is_protected() {
        let engine = engine().await;
        assert!(matches!(
            engine.delete_group(DEFAULT_GROUP).await,
            Err(EngineError::ProtectedGroup(_))
        ));
    }

    #[tokio::test]
    async fn test_create_group_rejects_duplicates() {
        let engine = engine().await;
        engine.create_group("admin").await.unwrap();
        assert!(matches!(
            engine.create_group("admin").await,
            Err(EngineError::Model(ModelError::GroupExists(_)))
        ));
    }

    #[tokio::test]
    async fn test_resolution_through_engine() {
        let engine = engine().await;
        let admin = engine.create_group("admin").await.unwrap();
        admin.write().unwrap().holder_mut().set_permission(
            Node::permission("perms.build").build().unwrap(),
            now_millis(),
        );

        let user = engine
            .get_or_load_user(UserId::random(), None)
            .await
            .unwrap();
        user.write().unwrap().holder_mut().set_permission(
            Node::group("admin").build().unwrap(),
            now_millis(),
        );

        let ctx = ContextSet::empty();
        assert_eq!(
            engine.check_permission(&user, "perms.build", &ctx),
            Tristate::True
        );
        assert_eq!(
            engine.check_permission(&user, "perms.other", &ctx),
            Tristate::Undefined
        );
    }

    #[tokio::test]
    async fn test_flush_persists_dirty_holders() {
        let engine = engine().await;
        let id = UserId::random();
        let user = engine.get_or_load_user(id, None).await.unwrap();

        user.write().unwrap().holder_mut().set_permission(
            Node::permission("perms.fly").build().unwrap(),
            now_millis(),
        );
        assert!(user.read().unwrap().holder().is_dirty());

        engine.flush().await.unwrap();

        let persisted = engine.store().load_user(id).await.unwrap().unwrap();
        assert!(persisted.nodes.iter().any(|n| n.key == "perms.fly"));
        assert!(!user.read().unwrap().holder().is_dirty());
    }

    #[tokio::test]
    async fn test_reload_roundtrip_through_store() {
        let engine = engine().await;
        let id = UserId::random();
        {
            let user = engine.get_or_load_user(id, Some("bob".to_string())).await.unwrap();
            user.write().unwrap().holder_mut().set_permission(
                Node::permission("perms.fly").build().unwrap(),
                now_millis(),
            );
            engine.flush().await.unwrap();
            engine.unload_user(id);
        }

        let user = engine.get_or_load_user(id, None).await.unwrap();
        assert_eq!(user.read().unwrap().username(), Some("bob"));
        assert_eq!(
            engine.check_permission(&user, "perms.fly", &ContextSet::empty()),
            Tristate::True
        );
    }

    #[tokio::test]
    async fn test_eviction_save_waits_for_in_flight_save() {
        let engine = engine().await;
        let id = UserId::random();
        let user = engine.get_or_load_user(id, None).await.unwrap();
        user.write().unwrap().holder_mut().set_permission(
            Node::permission("perms.fly").build().unwrap(),
            now_millis(),
        );

        // Occupy the user's save slot as a running background save would.
        let key = SaveKey::User(id);
        assert!(engine.inner.saves.begin(&key));

        engine.unload_user(id);
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;

        // The eviction write is deferred while the slot is held.
        let persisted = engine.store().load_user(id).await.unwrap().unwrap();
        assert!(persisted.nodes.iter().all(|n| n.key != "perms.fly"));

        // Drain the simulated save; requests that piled up while it ran
        // keep ownership until none remain.
        while engine.inner.saves.finish(&key) {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }

        // The eviction save acquires the slot and lands.
        let mut landed = false;
        for _ in 0..200 {
            let persisted = engine.store().load_user(id).await.unwrap().unwrap();
            if persisted.nodes.iter().any(|n| n.key == "perms.fly") {
                landed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(landed);
    }

    #[tokio::test]
    async fn test_track_lifecycle() {
        let engine = engine().await;
        engine
            .create_track("staff", vec!["default".to_string(), "admin".to_string()])
            .await
            .unwrap();

        let track = engine.get_track("staff").unwrap();
        assert_eq!(track.read().unwrap().next("default").unwrap(), Some("admin"));

        assert!(matches!(
            engine.create_track("staff", vec![]).await,
            Err(EngineError::Model(ModelError::TrackExists(_)))
        ));

        engine.delete_track("staff").await.unwrap();
        assert!(engine.get_track("staff").is_none());
        assert!(engine.store().load_track("staff").await.unwrap().is_none());
    }
}
