//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use warden_core::{ContextSet, Node};
use warden_model::{Group, GroupRegistry, PermissionHolder, Resolver, ResolverSettings};
use warden_store::MemoryStore;

/// A test fixture with an empty memory store and a group registry.
pub struct TestFixture {
    pub store: MemoryStore,
    pub groups: GroupRegistry,
}

impl TestFixture {
    /// Create a new empty fixture.
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            groups: GroupRegistry::new(),
        }
    }

    /// A fixture with the canonical three-tier ladder:
    /// `default` inherits nothing, `member` inherits `default`,
    /// `admin` inherits `member`.
    pub fn with_ladder() -> Self {
        let fixture = Self::new();
        fixture.add_group("default", &[grant("chat.speak")]);
        fixture.add_group(
            "member",
            &[grant("perms.build"), group_ref("default")],
        );
        fixture.add_group(
            "admin",
            &[grant("perms.fly"), grant("perms.*"), group_ref("member")],
        );
        fixture
    }

    /// Register a group holding the given nodes.
    pub fn add_group(&self, name: &str, nodes: &[Node]) {
        let mut group = Group::new(name);
        for node in nodes {
            group.holder_mut().set_permission(node.clone(), 0);
        }
        self.groups.insert(group);
    }

    /// A resolver with default settings over this fixture's groups.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(ResolverSettings::default(), &self.groups)
    }

    /// A resolver with explicit settings over this fixture's groups.
    pub fn resolver_with(&self, settings: ResolverSettings) -> Resolver<'_> {
        Resolver::new(settings, &self.groups)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A permanent context-free grant.
pub fn grant(key: &str) -> Node {
    Node::permission(key).build().expect("valid key")
}

/// A permanent context-free negation.
pub fn deny(key: &str) -> Node {
    Node::permission(key).value(false).build().expect("valid key")
}

/// A permanent context-free group membership.
pub fn group_ref(name: &str) -> Node {
    Node::group(name).build().expect("valid group name")
}

/// Build a holder from a node slice, sequenced in order.
pub fn holder(nodes: &[Node]) -> PermissionHolder {
    PermissionHolder::from_nodes(nodes.iter().cloned())
}

/// The empty query context.
pub fn global() -> ContextSet {
    ContextSet::empty()
}
