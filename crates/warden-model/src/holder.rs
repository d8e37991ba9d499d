//! The permission holder: a subject's owned collection of nodes.
//!
//! A holder owns its nodes exclusively; inheritance is expressed by
//! `GroupRef` nodes resolved by registry lookup, never by sharing node
//! objects across holders. The collection maintains the no-duplicate
//! invariant: at most one node per (key, contexts) identity, with
//! overwrite-on-set semantics.

use warden_core::{ContextSet, Node, NodeKind, Tristate};

use crate::temporary::TemporaryMergeBehaviour;

/// A stored node plus the logical sequence at which it was set.
///
/// The sequence is the last-resort precedence tie-break: among otherwise
/// equal candidates, the most recently set node wins.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub node: Node,
    pub seq: u64,
}

/// Outcome of a set operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// The node was stored. Carries the node actually stored, so callers
    /// can read the effective expiry after an `Accumulate` merge.
    Success(Node),
    /// An exact duplicate (same identity, value, and permanence) is
    /// already held.
    AlreadyHas,
    /// A conflicting temporary node exists and the merge policy is
    /// `Deny`.
    AlreadyHasTemporary,
}

/// Outcome of an unset operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsetOutcome {
    Success,
    DoesNotHave,
}

/// A subject's owned, unordered collection of permission nodes.
#[derive(Debug, Clone, Default)]
pub struct PermissionHolder {
    nodes: Vec<NodeEntry>,
    next_seq: u64,
    dirty: bool,
}

impl PermissionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a holder from a loaded node list. Sequence numbers follow
    /// list order; the holder starts clean.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut holder = Self::new();
        for node in nodes {
            let seq = holder.bump_seq();
            holder.nodes.push(NodeEntry { node, seq });
        }
        holder.dirty = false;
        holder
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// All stored entries, including any not-yet-pruned expired nodes.
    pub fn entries(&self) -> &[NodeEntry] {
        &self.nodes
    }

    /// Direct assertions, optionally filtered by containment against a
    /// supplied context (nodes that would apply in that context).
    pub fn own_nodes(&self, filter: Option<&ContextSet>) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|e| &e.node)
            .filter(|n| match filter {
                Some(ctx) => n.contexts().is_satisfied_by(ctx),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Direct-only check against the holder's own collection.
    ///
    /// Used to detect "already set" before mutating; independent of
    /// inheritance. With `check_value`, a held node with the opposite
    /// value yields `Undefined` rather than a defined answer.
    pub fn has_permission(&self, node: &Node, check_value: bool, now: i64) -> Tristate {
        let found = self.nodes.iter().find(|e| {
            e.node.same_identity(node)
                && e.node.is_temporary() == node.is_temporary()
                && !e.node.has_expired(now)
        });
        match found {
            Some(e) if !check_value || e.node.value() == node.value() => {
                Tristate::from_bool(e.node.value())
            }
            _ => Tristate::Undefined,
        }
    }

    /// Insert or overwrite per the no-duplicate identity invariant.
    pub fn set_permission(&mut self, node: Node, now: i64) -> SetOutcome {
        if let Some(existing) = self.find_identity(&node) {
            let duplicate = existing.node.value() == node.value()
                && existing.node.is_temporary() == node.is_temporary()
                && !existing.node.has_expired(now);
            if duplicate {
                return SetOutcome::AlreadyHas;
            }
        }
        self.replace(node.clone());
        SetOutcome::Success(node)
    }

    /// Set a temporary node, applying the merge policy against any
    /// existing temporary node of the same identity.
    ///
    /// The returned `Success` carries the node actually stored, whose
    /// expiry may differ from the input under `Accumulate`.
    pub fn set_permission_with(
        &mut self,
        node: Node,
        behaviour: TemporaryMergeBehaviour,
        now: i64,
    ) -> SetOutcome {
        debug_assert!(node.is_temporary());

        let existing = self
            .find_identity(&node)
            .filter(|e| e.node.is_temporary() && !e.node.has_expired(now))
            .map(|e| e.node.clone());

        let stored = match existing {
            None => node,
            Some(old) => match behaviour {
                TemporaryMergeBehaviour::Deny => return SetOutcome::AlreadyHasTemporary,
                TemporaryMergeBehaviour::Replace => node,
                TemporaryMergeBehaviour::Accumulate => {
                    // Extend the existing expiry by the new duration,
                    // not from the current time.
                    let new_duration = node.expiry().unwrap_or(now) - now;
                    let old_expiry = old.expiry().unwrap_or(now);
                    node.with_expiry(Some(old_expiry + new_duration))
                }
            },
        };

        self.replace(stored.clone());
        SetOutcome::Success(stored)
    }

    /// Remove the node with the same identity, if present.
    pub fn unset_permission(&mut self, node: &Node) -> UnsetOutcome {
        let before = self.nodes.len();
        self.nodes.retain(|e| !e.node.same_identity(node));
        if self.nodes.len() < before {
            self.dirty = true;
            UnsetOutcome::Success
        } else {
            UnsetOutcome::DoesNotHave
        }
    }

    /// Remove every meta node for `key` that would apply in `context`.
    ///
    /// A subject should hold at most one effective value per meta key
    /// per context; callers invoke this before setting a new value.
    pub fn clear_meta_keys(
        &mut self,
        key: &str,
        context: &ContextSet,
        temporary_only: bool,
    ) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|e| {
            let is_match = matches!(e.node.kind(), NodeKind::Meta { key: k, .. } if k == key)
                && e.node.contexts().is_satisfied_by(context)
                && (!temporary_only || e.node.is_temporary());
            !is_match
        });
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Bulk remove by predicate, optionally restricted to nodes that
    /// would apply in `context`.
    pub fn clear_nodes<P>(&mut self, predicate: P, context: Option<&ContextSet>) -> usize
    where
        P: Fn(&Node) -> bool,
    {
        let before = self.nodes.len();
        self.nodes.retain(|e| {
            let in_scope = match context {
                Some(ctx) => e.node.contexts().is_satisfied_by(ctx),
                None => true,
            };
            !(in_scope && predicate(&e.node))
        });
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Prune nodes whose expiry has passed. Expired nodes are already
    /// excluded from checks; this reclaims the storage.
    pub fn auto_remove_expired(&mut self, now: i64) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|e| !e.node.has_expired(now));
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Whether a mutation has occurred since the last persistence sync.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn find_identity(&self, node: &Node) -> Option<&NodeEntry> {
        self.nodes.iter().find(|e| e.node.same_identity(node))
    }

    /// Remove any same-identity entry and insert the node fresh.
    fn replace(&mut self, node: Node) {
        self.nodes.retain(|e| !e.node.same_identity(&node));
        let seq = self.bump_seq();
        self.nodes.push(NodeEntry { node, seq });
        self.dirty = true;
    }
}
