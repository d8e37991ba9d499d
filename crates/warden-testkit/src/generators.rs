//! Proptest generators for core types.

use proptest::prelude::*;

use warden_core::{ContextSet, Node};

/// A dotted permission key, one to four segments. First segments that
/// would classify as a structured node are rejected.
pub fn permission_key() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}".prop_filter("reserved namespace", |key| {
        let head = key.split('.').next().unwrap_or(key);
        !matches!(head, "meta" | "prefix" | "suffix" | "weight" | "group")
    })
}

/// A wildcard permission key: a stem followed by `.*`.
pub fn wildcard_key() -> impl Strategy<Value = String> {
    permission_key().prop_map(|stem| format!("{stem}.*"))
}

/// A lowercase group name.
pub fn group_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,15}".prop_map(String::from)
}

/// A context set with up to three pairs, possibly empty.
pub fn context_set() -> impl Strategy<Value = ContextSet> {
    proptest::collection::btree_set(("[a-z]{1,6}".prop_map(String::from), "[a-z0-9]{1,8}".prop_map(String::from)), 0..=3)
        .prop_map(ContextSet::from_pairs)
}

/// A millisecond expiry strictly in the future relative to zero.
pub fn expiry_millis() -> impl Strategy<Value = i64> {
    1i64..=10_000_000_000
}

/// A permission node with arbitrary key, value, contexts, and
/// optional expiry.
pub fn permission_node() -> impl Strategy<Value = Node> {
    (
        permission_key(),
        any::<bool>(),
        context_set(),
        proptest::option::of(expiry_millis()),
    )
        .prop_map(|(key, value, ctx, expiry)| {
            let mut builder = Node::permission(key).value(value).with_extra_context(&ctx);
            if let Some(ts) = expiry {
                builder = builder.expiry(ts);
            }
            builder.build().expect("generated key is valid")
        })
}

/// A group membership node over a generated group name.
pub fn group_node() -> impl Strategy<Value = Node> {
    (group_name(), any::<bool>()).prop_map(|(name, value)| {
        Node::group(&name)
            .value(value)
            .build()
            .expect("generated group name is valid")
    })
}
