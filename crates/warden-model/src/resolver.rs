//! The resolution algorithm.
//!
//! Given a holder, a permission string (or meta key), and a query
//! context, computes the effective tristate (or meta value) by walking
//! the holder's inheritance closure and applying pattern expansion and
//! precedence rules.
//!
//! Precedence among matching candidates, in order:
//! 1. nodes on the holder itself before inherited nodes;
//! 2. among inherited nodes, lower distance (closer group) wins, then
//!    higher declared priority;
//! 3. among equal-rank candidates, an explicit negative wins when
//!    negation is configured as authoritative, otherwise the
//!    most-specific (longest) key wins;
//! 4. if still tied, the most recently set node wins.
//!
//! Absence of any matching candidate yields `Undefined`, never an error.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet, VecDeque};

use regex::Regex;
use tracing::warn;

use warden_core::{shorthand, ContextSet, Node, NodeKind, PatternKind, Tristate};
use warden_core::{SERVER_KEY, WORLD_KEY};

use crate::holder::{NodeEntry, PermissionHolder};
use crate::registry::GroupRegistry;

/// Engine-wide switches governing which candidate kinds participate in
/// resolution. When a flag is off, candidates of that kind are excluded
/// entirely, not merely deprioritized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Apply wildcard nodes (`a.b.*`).
    pub apply_wildcards: bool,
    /// Apply regex nodes (`r=<pattern>`).
    pub apply_regex: bool,
    /// Expand shorthand nodes (`foo.(a|b)`).
    pub apply_shorthand: bool,
    /// Apply server-global permissions when the query names a server.
    pub include_global_perms: bool,
    /// Apply world-global permissions when the query names a world.
    pub include_global_world_perms: bool,
    /// Follow server-global group memberships when the query names a server.
    pub apply_global_groups: bool,
    /// Follow world-global group memberships when the query names a world.
    pub apply_global_world_groups: bool,
    /// Treat an explicit negation as outranking an equal-rank positive.
    pub negation_authoritative: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            apply_wildcards: true,
            apply_regex: true,
            apply_shorthand: true,
            include_global_perms: true,
            include_global_world_perms: true,
            apply_global_groups: true,
            apply_global_world_groups: true,
            negation_authoritative: true,
        }
    }
}

/// A node flattened out of the inheritance closure, tagged with the
/// rank information precedence needs.
#[derive(Debug, Clone)]
struct Candidate {
    node: Node,
    /// 0 = the holder's own node; n = inherited through n group hops.
    distance: u32,
    /// Declared priority of the inheritance edge that introduced the
    /// source group (0 for own nodes and undeclared edges).
    priority: i64,
    /// Logical set-time within the source holder.
    seq: u64,
}

/// Resolves permissions and meta against a group registry.
pub struct Resolver<'a> {
    settings: ResolverSettings,
    groups: &'a GroupRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: ResolverSettings, groups: &'a GroupRegistry) -> Self {
        Self { settings, groups }
    }

    /// Compute the effective tristate for `key` in `ctx`.
    pub fn resolve_permission(
        &self,
        holder: &PermissionHolder,
        key: &str,
        ctx: &ContextSet,
        now: i64,
    ) -> Tristate {
        let mut matching: Vec<Candidate> = self
            .candidates(holder, ctx, now)
            .into_iter()
            .filter(|c| self.matches(&c.node, key))
            .collect();

        matching.sort_by(|a, b| self.precedence(a, b));
        match matching.first() {
            Some(c) => Tristate::from_bool(c.node.value()),
            None => Tristate::Undefined,
        }
    }

    /// Compute the effective value for a meta key in `ctx`, if any.
    pub fn resolve_meta(
        &self,
        holder: &PermissionHolder,
        meta_key: &str,
        ctx: &ContextSet,
        now: i64,
    ) -> Option<String> {
        let mut matching: Vec<(Candidate, String)> = self
            .candidates(holder, ctx, now)
            .into_iter()
            .filter_map(|c| match c.node.kind() {
                NodeKind::Meta { key, value } if key == meta_key && c.node.value() => {
                    let value = value.clone();
                    Some((c, value))
                }
                _ => None,
            })
            .collect();

        matching.sort_by(|a, b| self.precedence(&a.0, &b.0));
        matching.into_iter().next().map(|(_, v)| v)
    }

    /// Compute the full effective meta map for `ctx`: for each meta key,
    /// the first value in precedence order.
    pub fn effective_meta(
        &self,
        holder: &PermissionHolder,
        ctx: &ContextSet,
        now: i64,
    ) -> BTreeMap<String, String> {
        let mut metas: Vec<(Candidate, String, String)> = self
            .candidates(holder, ctx, now)
            .into_iter()
            .filter_map(|c| match c.node.kind() {
                NodeKind::Meta { key, value } if c.node.value() => {
                    let (key, value) = (key.clone(), value.clone());
                    Some((c, key, value))
                }
                _ => None,
            })
            .collect();

        metas.sort_by(|a, b| self.precedence(&a.0, &b.0));

        let mut map = BTreeMap::new();
        for (_, key, value) in metas {
            map.entry(key).or_insert(value);
        }
        map
    }

    /// Build the flattened candidate set: the holder's own nodes plus
    /// every node of every group in the inheritance closure, walked
    /// breadth-first with cycle protection.
    fn candidates(&self, holder: &PermissionHolder, ctx: &ContextSet, now: i64) -> Vec<Candidate> {
        let mut out = Vec::new();
        let mut queue: VecDeque<(String, u32, i64)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();

        self.collect(holder.entries(), 0, 0, ctx, now, &mut out, &mut queue);

        while let Some((name, distance, priority)) = queue.pop_front() {
            // Cycle guard: a group already visited is not revisited.
            if !visited.insert(name.clone()) {
                continue;
            }

            let Some(group) = self.groups.get(&name) else {
                // Inheritance integrity error: treat the edge as absent
                // and resolve in degraded mode.
                warn!(group = %name, "inherited group not present in registry; skipping");
                continue;
            };

            let group = group.read().unwrap();
            self.collect(
                group.holder().entries(),
                distance,
                priority,
                ctx,
                now,
                &mut out,
                &mut queue,
            );
        }

        out
    }

    /// Collect one holder's entries into the candidate set and enqueue
    /// its applicable inheritance edges.
    #[allow(clippy::too_many_arguments)]
    fn collect(
        &self,
        entries: &[NodeEntry],
        distance: u32,
        priority: i64,
        ctx: &ContextSet,
        now: i64,
        out: &mut Vec<Candidate>,
        queue: &mut VecDeque<(String, u32, i64)>,
    ) {
        for entry in entries {
            // The edge and candidate roles of a membership node are
            // gated independently: the group flags decide whether the
            // edge is followed, the perms flags decide whether the node
            // itself is a candidate.
            if let NodeKind::GroupRef {
                name,
                priority: declared,
            } = entry.node.kind()
            {
                // A negated membership never contributes an edge.
                if entry.node.value() && self.node_applies(&entry.node, ctx, now, true) {
                    queue.push_back((name.clone(), distance + 1, declared.unwrap_or(0)));
                }
            }

            if !self.node_applies(&entry.node, ctx, now, false) {
                continue;
            }

            out.push(Candidate {
                node: entry.node.clone(),
                distance,
                priority,
                seq: entry.seq,
            });
        }
    }

    /// Expiry, context containment, and global-context gating.
    fn node_applies(&self, node: &Node, ctx: &ContextSet, now: i64, as_edge: bool) -> bool {
        if node.has_expired(now) {
            return false;
        }
        if !node.contexts().is_satisfied_by(ctx) {
            return false;
        }

        let (include_server_global, include_world_global) = if as_edge {
            (
                self.settings.apply_global_groups,
                self.settings.apply_global_world_groups,
            )
        } else {
            (
                self.settings.include_global_perms,
                self.settings.include_global_world_perms,
            )
        };

        if !include_server_global
            && ctx.contains_key(SERVER_KEY)
            && !node.contexts().contains_key(SERVER_KEY)
        {
            return false;
        }
        if !include_world_global
            && ctx.contains_key(WORLD_KEY)
            && !node.contexts().contains_key(WORLD_KEY)
        {
            return false;
        }
        true
    }

    /// Whether a candidate node's key matches the queried permission.
    fn matches(&self, node: &Node, key: &str) -> bool {
        match node.pattern_kind() {
            PatternKind::Exact => node.key() == key,
            PatternKind::Wildcard { stem } => {
                if !self.settings.apply_wildcards {
                    return false;
                }
                if stem.is_empty() {
                    return true;
                }
                key.len() > stem.len() + 1
                    && key.starts_with(&stem)
                    && key.as_bytes()[stem.len()] == b'.'
            }
            PatternKind::Regex { pattern } => {
                if !self.settings.apply_regex {
                    return false;
                }
                match Regex::new(&format!("^(?:{})$", pattern)) {
                    Ok(re) => re.is_match(key),
                    Err(err) => {
                        warn!(node = node.key(), %err, "invalid regex node; ignoring");
                        false
                    }
                }
            }
            PatternKind::Shorthand => {
                if !self.settings.apply_shorthand {
                    return false;
                }
                match shorthand::expand(node.key()) {
                    Ok(expansion) => expansion.iter().any(|k| k == key),
                    Err(_) => false,
                }
            }
        }
    }

    /// Total precedence order: `Less` means `a` outranks `b`.
    fn precedence(&self, a: &Candidate, b: &Candidate) -> Ordering {
        a.distance
            .cmp(&b.distance)
            .then(b.priority.cmp(&a.priority))
            .then_with(|| {
                if self.settings.negation_authoritative {
                    // false sorts before true: an explicit negative wins.
                    a.node.value().cmp(&b.node.value())
                } else {
                    Ordering::Equal
                }
            })
            .then(b.node.key().len().cmp(&a.node.key().len()))
            .then(b.seq.cmp(&a.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;
    use warden_core::Node;

    fn holder_with(nodes: &[Node]) -> PermissionHolder {
        PermissionHolder::from_nodes(nodes.iter().cloned())
    }

    fn group_with(registry: &GroupRegistry, name: &str, nodes: &[Node]) {
        let mut group = Group::new(name);
        for n in nodes {
            group.holder_mut().set_permission(n.clone(), 0);
        }
        registry.insert(group);
    }

    fn perm(key: &str, value: bool) -> Node {
        Node::permission(key).value(value).build().unwrap()
    }

    fn resolver(groups: &GroupRegistry) -> Resolver<'_> {
        Resolver::new(ResolverSettings::default(), groups)
    }

    #[test]
    fn test_basic_scenario() {
        let groups = GroupRegistry::new();
        group_with(&groups, "admin", &[perm("perms.build", true)]);

        let holder = holder_with(&[
            perm("perms.fly", true),
            Node::group("admin").build().unwrap(),
        ]);

        let r = resolver(&groups);
        let ctx = ContextSet::empty();
        assert_eq!(r.resolve_permission(&holder, "perms.fly", &ctx, 0), Tristate::True);
        assert_eq!(r.resolve_permission(&holder, "perms.build", &ctx, 0), Tristate::True);
        assert_eq!(
            r.resolve_permission(&holder, "perms.other", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_unmentioned_is_undefined_not_false() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[]);
        let out = resolver(&groups).resolve_permission(
            &holder,
            "never.mentioned",
            &ContextSet::empty(),
            0,
        );
        assert_eq!(out, Tristate::Undefined);
    }

    #[test]
    fn test_wildcard_toggle() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[perm("a.b.*", true)]);
        let ctx = ContextSet::empty();

        let on = resolver(&groups);
        assert_eq!(on.resolve_permission(&holder, "a.b.c", &ctx, 0), Tristate::True);
        // No partial-segment matches.
        assert_eq!(on.resolve_permission(&holder, "a.bc", &ctx, 0), Tristate::Undefined);

        let off = Resolver::new(
            ResolverSettings {
                apply_wildcards: false,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            off.resolve_permission(&holder, "a.b.c", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_root_wildcard() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[perm("*", true)]);
        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "anything.at.all", &ContextSet::empty(), 0),
            Tristate::True
        );
    }

    #[test]
    fn test_regex_toggle() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[perm("r=perms\\.(fly|build)", true)]);
        let ctx = ContextSet::empty();

        let on = resolver(&groups);
        assert_eq!(on.resolve_permission(&holder, "perms.fly", &ctx, 0), Tristate::True);
        assert_eq!(
            on.resolve_permission(&holder, "perms.other", &ctx, 0),
            Tristate::Undefined
        );

        let off = Resolver::new(
            ResolverSettings {
                apply_regex: false,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            off.resolve_permission(&holder, "perms.fly", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_shorthand_toggle() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[perm("perms.(fly|build)", true)]);
        let ctx = ContextSet::empty();

        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "perms.build", &ctx, 0),
            Tristate::True
        );

        let off = Resolver::new(
            ResolverSettings {
                apply_shorthand: false,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            off.resolve_permission(&holder, "perms.build", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_own_node_outranks_inherited_regardless_of_negation() {
        let groups = GroupRegistry::new();
        group_with(&groups, "admin", &[perm("x", true)]);

        let holder = holder_with(&[
            perm("x", false),
            Node::group("admin").build().unwrap(),
        ]);
        let ctx = ContextSet::empty();

        for negation_authoritative in [true, false] {
            let r = Resolver::new(
                ResolverSettings {
                    negation_authoritative,
                    ..Default::default()
                },
                &groups,
            );
            assert_eq!(r.resolve_permission(&holder, "x", &ctx, 0), Tristate::False);
        }
    }

    #[test]
    fn test_closer_group_wins() {
        let groups = GroupRegistry::new();
        group_with(
            &groups,
            "near",
            &[perm("x", false), Node::group("far").build().unwrap()],
        );
        group_with(&groups, "far", &[perm("x", true)]);

        let holder = holder_with(&[Node::group("near").build().unwrap()]);
        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "x", &ContextSet::empty(), 0),
            Tristate::False
        );
    }

    #[test]
    fn test_declared_priority_breaks_distance_ties() {
        let groups = GroupRegistry::new();
        group_with(&groups, "low", &[perm("x", false)]);
        group_with(&groups, "high", &[perm("x", true)]);

        let holder = holder_with(&[
            Node::group_with_priority("low", 1).build().unwrap(),
            Node::group_with_priority("high", 10).build().unwrap(),
        ]);

        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "x", &ContextSet::empty(), 0),
            Tristate::True
        );
    }

    #[test]
    fn test_negation_wins_at_equal_rank_when_authoritative() {
        let groups = GroupRegistry::new();
        // Same rank: both own nodes. Wildcard grants, exact denies.
        let holder = holder_with(&[perm("a.b.*", true), perm("a.b.c", false)]);
        let ctx = ContextSet::empty();

        let authoritative = resolver(&groups);
        assert_eq!(
            authoritative.resolve_permission(&holder, "a.b.c", &ctx, 0),
            Tristate::False
        );

        // Without authoritative negation, the most specific key wins;
        // "a.b.c" (exact) is longer than the wildcard stem match.
        let specific = Resolver::new(
            ResolverSettings {
                negation_authoritative: false,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            specific.resolve_permission(&holder, "a.b.c", &ctx, 0),
            Tristate::False
        );

        // When the exact node grants and the wildcard denies, the two
        // policies disagree.
        let holder2 = holder_with(&[perm("a.b.*", false), perm("a.b.c", true)]);
        assert_eq!(
            authoritative.resolve_permission(&holder2, "a.b.c", &ctx, 0),
            Tristate::False
        );
        assert_eq!(
            specific.resolve_permission(&holder2, "a.b.c", &ctx, 0),
            Tristate::True
        );
    }

    #[test]
    fn test_later_set_wins_last() {
        let groups = GroupRegistry::new();
        // Two shorthand nodes of identical length and rank, both
        // matching the key, opposite values, negation not authoritative.
        let mut holder = PermissionHolder::new();
        holder.set_permission(perm("q.(a|b)", true), 0);
        holder.set_permission(perm("q.(a|c)", false), 0);

        let r = Resolver::new(
            ResolverSettings {
                negation_authoritative: false,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            r.resolve_permission(&holder, "q.a", &ContextSet::empty(), 0),
            Tristate::False
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let groups = GroupRegistry::new();
        group_with(
            &groups,
            "a",
            &[perm("from.a", true), Node::group("b").build().unwrap()],
        );
        group_with(
            &groups,
            "b",
            &[perm("from.b", true), Node::group("a").build().unwrap()],
        );

        let holder = holder_with(&[Node::group("a").build().unwrap()]);
        let r = resolver(&groups);
        let ctx = ContextSet::empty();

        assert_eq!(r.resolve_permission(&holder, "from.a", &ctx, 0), Tristate::True);
        assert_eq!(r.resolve_permission(&holder, "from.b", &ctx, 0), Tristate::True);
        assert_eq!(r.resolve_permission(&holder, "from.c", &ctx, 0), Tristate::Undefined);
    }

    #[test]
    fn test_unknown_group_degrades_gracefully() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[
            Node::group("ghost").build().unwrap(),
            perm("perms.fly", true),
        ]);

        let r = resolver(&groups);
        assert_eq!(
            r.resolve_permission(&holder, "perms.fly", &ContextSet::empty(), 0),
            Tristate::True
        );
    }

    #[test]
    fn test_context_containment() {
        let groups = GroupRegistry::new();
        let node = Node::permission("perms.fly")
            .with_context("world", "nether")
            .build()
            .unwrap();
        let holder = holder_with(&[node]);
        let r = resolver(&groups);

        let overworld = ContextSet::singleton("world", "overworld");
        assert_eq!(
            r.resolve_permission(&holder, "perms.fly", &overworld, 0),
            Tristate::Undefined
        );

        let superset = ContextSet::from_pairs([("world", "nether"), ("server", "s1")]);
        assert_eq!(
            r.resolve_permission(&holder, "perms.fly", &superset, 0),
            Tristate::True
        );
    }

    #[test]
    fn test_global_perms_toggle() {
        let groups = GroupRegistry::new();
        let holder = holder_with(&[perm("perms.fly", true)]);
        let ctx = ContextSet::singleton("server", "s1");

        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "perms.fly", &ctx, 0),
            Tristate::True
        );

        let strict = Resolver::new(
            ResolverSettings {
                include_global_perms: false,
                ..Default::default()
            },
            &groups,
        );
        // A server-global node no longer applies in a server-scoped query.
        assert_eq!(
            strict.resolve_permission(&holder, "perms.fly", &ctx, 0),
            Tristate::Undefined
        );
        // But still applies to a query without a server dimension.
        assert_eq!(
            strict.resolve_permission(&holder, "perms.fly", &ContextSet::empty(), 0),
            Tristate::True
        );
    }

    #[test]
    fn test_global_groups_toggle() {
        let groups = GroupRegistry::new();
        group_with(&groups, "admin", &[perm("perms.build", true)]);
        let holder = holder_with(&[Node::group("admin").build().unwrap()]);
        let ctx = ContextSet::singleton("server", "s1");

        let strict = Resolver::new(
            ResolverSettings {
                apply_global_groups: false,
                include_global_perms: true,
                ..Default::default()
            },
            &groups,
        );
        // The serverless membership edge is not followed.
        assert_eq!(
            strict.resolve_permission(&holder, "perms.build", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_global_group_edge_independent_of_perms_flags() {
        let groups = GroupRegistry::new();
        // The inherited grant is server-scoped, so it survives the
        // strict perms-global filter; only the membership edge is
        // context-free.
        group_with(
            &groups,
            "admin",
            &[Node::permission("perms.build")
                .with_context("server", "s1")
                .build()
                .unwrap()],
        );
        let holder = holder_with(&[Node::group("admin").build().unwrap()]);
        let ctx = ContextSet::singleton("server", "s1");

        let strict = Resolver::new(
            ResolverSettings {
                include_global_perms: false,
                apply_global_groups: true,
                ..Default::default()
            },
            &groups,
        );
        assert_eq!(
            strict.resolve_permission(&holder, "perms.build", &ctx, 0),
            Tristate::True
        );
        // The membership node itself is still filtered as a permission
        // candidate.
        assert_eq!(
            strict.resolve_permission(&holder, "group.admin", &ctx, 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_expired_node_excluded() {
        let groups = GroupRegistry::new();
        let node = Node::permission("perms.fly").expiry(1_000).build().unwrap();
        let holder = holder_with(&[node]);
        let r = resolver(&groups);
        let ctx = ContextSet::empty();

        assert_eq!(r.resolve_permission(&holder, "perms.fly", &ctx, 500), Tristate::True);
        assert_eq!(
            r.resolve_permission(&holder, "perms.fly", &ctx, 1_500),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_expired_membership_not_followed() {
        let groups = GroupRegistry::new();
        group_with(&groups, "vip", &[perm("perms.vip", true)]);

        let membership = Node::group("vip").expiry(1_000).build().unwrap();
        let holder = holder_with(&[membership]);
        let r = resolver(&groups);
        let ctx = ContextSet::empty();

        assert_eq!(r.resolve_permission(&holder, "perms.vip", &ctx, 500), Tristate::True);
        assert_eq!(
            r.resolve_permission(&holder, "perms.vip", &ctx, 1_500),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_negated_membership_not_followed() {
        let groups = GroupRegistry::new();
        group_with(&groups, "vip", &[perm("perms.vip", true)]);

        let holder = holder_with(&[Node::group("vip").value(false).build().unwrap()]);
        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "perms.vip", &ContextSet::empty(), 0),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_group_membership_visible_as_permission() {
        let groups = GroupRegistry::new();
        group_with(&groups, "admin", &[]);
        let holder = holder_with(&[Node::group("admin").build().unwrap()]);

        assert_eq!(
            resolver(&groups).resolve_permission(&holder, "group.admin", &ContextSet::empty(), 0),
            Tristate::True
        );
    }

    #[test]
    fn test_meta_resolution() {
        let groups = GroupRegistry::new();
        group_with(
            &groups,
            "admin",
            &[Node::meta("color", "red").build().unwrap()],
        );

        let holder = holder_with(&[
            Node::meta("color", "blue").build().unwrap(),
            Node::group("admin").build().unwrap(),
        ]);

        let r = resolver(&groups);
        let ctx = ContextSet::empty();

        // Own meta outranks inherited.
        assert_eq!(
            r.resolve_meta(&holder, "color", &ctx, 0),
            Some("blue".to_string())
        );
        assert_eq!(r.resolve_meta(&holder, "missing", &ctx, 0), None);

        let map = r.effective_meta(&holder, &ctx, 0);
        assert_eq!(map.get("color"), Some(&"blue".to_string()));
    }

    #[test]
    fn test_effective_meta_merges_inherited_keys() {
        let groups = GroupRegistry::new();
        group_with(
            &groups,
            "admin",
            &[
                Node::meta("color", "red").build().unwrap(),
                Node::meta("badge", "star").build().unwrap(),
            ],
        );

        let holder = holder_with(&[
            Node::meta("color", "blue").build().unwrap(),
            Node::group("admin").build().unwrap(),
        ]);

        let map = resolver(&groups).effective_meta(&holder, &ContextSet::empty(), 0);
        assert_eq!(map.get("color"), Some(&"blue".to_string()));
        assert_eq!(map.get("badge"), Some(&"star".to_string()));
    }
}
