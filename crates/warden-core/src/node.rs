//! Permission nodes: the atomic unit of policy.
//!
//! A node asserts one fact about a holder: a permission (granted or
//! negated), a meta key/value, a chat prefix or suffix, a weight, or an
//! inheritance reference to a group. Node identity is the pair
//! (key, contexts); value and expiry are *not* part of identity, so
//! setting the same key in the same context overwrites rather than
//! duplicates.

use std::fmt;

use crate::context::ContextSet;
use crate::error::Result;
use crate::factory;
use crate::shorthand;

/// Marker prefixes denoting a regex permission key.
const REGEX_MARKERS: [&str; 2] = ["r=", "R="];

/// The structured classification of a node, derived from its key.
///
/// String prefix encoding (`meta.`, `prefix.`, `group.` ...) is confined
/// to the factory; the resolution algorithm only ever branches on this
/// variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A plain permission assertion.
    Permission,
    /// A meta key/value pair.
    Meta { key: String, value: String },
    /// A chat prefix with a priority.
    Prefix { priority: i64, text: String },
    /// A chat suffix with a priority.
    Suffix { priority: i64, text: String },
    /// A group weight, used to order groups of equal rank.
    Weight(i64),
    /// An inheritance reference to a group, with an optional declared
    /// priority used for ordering among multiple inherited groups.
    GroupRef {
        name: String,
        priority: Option<i64>,
    },
}

/// How a permission key participates in pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// Matches only its exact key.
    Exact,
    /// `a.b.*`: matches any key under the stem `a.b`. The bare key `*`
    /// matches everything.
    Wildcard { stem: String },
    /// `r=<pattern>`: matched as an anchored regex.
    Regex { pattern: String },
    /// `foo.(a|b)`: matches any member of the expansion set.
    Shorthand,
}

/// A single permission or metadata assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    key: String,
    value: bool,
    contexts: ContextSet,
    expiry: Option<i64>,
    kind: NodeKind,
}

impl Node {
    /// Construct a node from a raw key, deriving its kind.
    ///
    /// Fails when the key encodes a malformed structured node (e.g. a
    /// `prefix.` node with a non-numeric priority).
    pub fn new(
        key: impl Into<String>,
        value: bool,
        contexts: ContextSet,
        expiry: Option<i64>,
    ) -> Result<Self> {
        let key = key.into();
        let kind = factory::classify(&key)?;
        Ok(Self {
            key,
            value,
            contexts,
            expiry,
            kind,
        })
    }

    /// Start building a plain permission node.
    pub fn permission(key: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(key.into())
    }

    /// Start building a meta node for `key` = `value`.
    pub fn meta(key: &str, value: &str) -> NodeBuilder {
        NodeBuilder::new(factory::encode_meta(key, value))
    }

    /// Start building an inheritance reference to `group`.
    pub fn group(group: &str) -> NodeBuilder {
        NodeBuilder::new(factory::encode_group(group, None))
    }

    /// Start building an inheritance reference with a declared priority.
    pub fn group_with_priority(group: &str, priority: i64) -> NodeBuilder {
        NodeBuilder::new(factory::encode_group(group, Some(priority)))
    }

    /// Start building a prefix node.
    pub fn prefix(priority: i64, text: &str) -> NodeBuilder {
        NodeBuilder::new(factory::encode_prefix(priority, text))
    }

    /// Start building a suffix node.
    pub fn suffix(priority: i64, text: &str) -> NodeBuilder {
        NodeBuilder::new(factory::encode_suffix(priority, text))
    }

    /// Start building a weight node.
    pub fn weight(weight: i64) -> NodeBuilder {
        NodeBuilder::new(factory::encode_weight(weight))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    pub fn expiry(&self) -> Option<i64> {
        self.expiry
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether this node carries an expiry at all.
    pub fn is_temporary(&self) -> bool {
        self.expiry.is_some()
    }

    /// Whether this node's expiry has passed. An expired node is
    /// logically inert: excluded from resolution, pruned eventually.
    pub fn has_expired(&self, now: i64) -> bool {
        matches!(self.expiry, Some(e) if e <= now)
    }

    /// Identity comparison: same key and same context set, ignoring
    /// value and expiry. This is the overwrite-on-set invariant key.
    pub fn same_identity(&self, other: &Node) -> bool {
        self.key == other.key && self.contexts == other.contexts
    }

    /// The group name referenced by this node, if it is a `GroupRef`.
    pub fn group_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::GroupRef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// How this node's key participates in pattern matching.
    pub fn pattern_kind(&self) -> PatternKind {
        for marker in REGEX_MARKERS {
            if let Some(pattern) = self.key.strip_prefix(marker) {
                return PatternKind::Regex {
                    pattern: pattern.to_string(),
                };
            }
        }
        if self.key == "*" {
            return PatternKind::Wildcard {
                stem: String::new(),
            };
        }
        if let Some(stem) = self.key.strip_suffix(".*") {
            return PatternKind::Wildcard {
                stem: stem.to_string(),
            };
        }
        if shorthand::is_shorthand(&self.key) {
            return PatternKind::Shorthand;
        }
        PatternKind::Exact
    }

    /// Return a copy with a different value.
    pub fn with_value(&self, value: bool) -> Node {
        let mut n = self.clone();
        n.value = value;
        n
    }

    /// Return a copy with a different expiry.
    pub fn with_expiry(&self, expiry: Option<i64>) -> Node {
        let mut n = self.clone();
        n.expiry = expiry;
        n
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)?;
        if !self.contexts.is_empty() {
            write!(f, " ({})", self.contexts)?;
        }
        if let Some(e) = self.expiry {
            write!(f, " until {}", e)?;
        }
        Ok(())
    }
}

/// Fluent builder for nodes.
///
/// Builders are pure: they never touch a holder or any shared state.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    key: String,
    value: bool,
    contexts: ContextSet,
    expiry: Option<i64>,
}

impl NodeBuilder {
    fn new(key: String) -> Self {
        Self {
            key,
            value: true,
            contexts: ContextSet::empty(),
            expiry: None,
        }
    }

    /// Set the node value (defaults to true).
    pub fn value(mut self, value: bool) -> Self {
        self.value = value;
        self
    }

    /// Merge additional context pairs into the node's scope.
    pub fn with_extra_context(mut self, extra: &ContextSet) -> Self {
        let mut merged = self.contexts.unfreeze();
        for (k, v) in extra.iter() {
            merged.add(k, v);
        }
        self.contexts = merged.freeze();
        self
    }

    /// Add a single context pair.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut m = self.contexts.unfreeze();
        m.add(key, value);
        self.contexts = m.freeze();
        self
    }

    /// Set an absolute expiry timestamp (Unix milliseconds).
    pub fn expiry(mut self, timestamp: i64) -> Self {
        self.expiry = Some(timestamp);
        self
    }

    /// Set an expiry `seconds` from the supplied wall-clock time.
    pub fn duration(mut self, now: i64, seconds: i64) -> Self {
        self.expiry = Some(now + seconds * 1000);
        self
    }

    /// Clear any expiry, making the node permanent.
    pub fn permanent(mut self) -> Self {
        self.expiry = None;
        self
    }

    /// Finish, validating the key encoding.
    pub fn build(self) -> Result<Node> {
        Node::new(self.key, self.value, self.contexts, self.expiry)
    }
}
