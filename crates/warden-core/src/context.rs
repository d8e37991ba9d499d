//! Context sets: the situational dimensions a check or node is scoped to.
//!
//! A context set is a multimap of key/value string pairs (e.g.
//! `world=nether`, `server=lobby`). Keys need not be unique: a query
//! context may carry several values for the same key, such as multiple
//! world aliases. A node applies to a query when the node's own context
//! set is *contained* in the query context set; the empty set is
//! contained in everything.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Context key used for the server dimension.
pub const SERVER_KEY: &str = "server";

/// Context key used for the world dimension.
pub const WORLD_KEY: &str = "world";

/// An immutable context set.
///
/// Once frozen, a `ContextSet` never changes; resolution always works
/// against frozen snapshots so a concurrent writer cannot produce a torn
/// read. Equality is set equality over (key, value) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSet {
    pairs: BTreeSet<(String, String)>,
}

impl ContextSet {
    /// The empty context set, which matches universally.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a context set from an iterator of pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A set holding a single pair.
    pub fn singleton(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::from_pairs([(key.into(), value.into())])
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the exact (key, value) pair is present.
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.pairs
            .contains(&(key.to_string(), value.to_string()))
    }

    /// Whether any pair with the given key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// All values held for a key.
    pub fn values_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The containment test used during resolution.
    ///
    /// Returns true iff every pair in `self` is present in `other`. The
    /// empty set is satisfied by anything.
    pub fn is_satisfied_by(&self, other: &ContextSet) -> bool {
        self.pairs.iter().all(|p| other.pairs.contains(p))
    }

    /// Iterate over all pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Unfreeze into a mutable copy.
    pub fn unfreeze(&self) -> MutableContextSet {
        MutableContextSet {
            pairs: self.pairs.clone(),
        }
    }
}

impl fmt::Display for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for ContextSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// A mutable context set, used while assembling a query or node scope.
///
/// Mutation is never observed concurrently with resolution reads:
/// callers freeze the set before handing it to a node or a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutableContextSet {
    pairs: BTreeSet<(String, String)>,
}

impl MutableContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a (key, value) pair. Adding an existing pair is a no-op.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert((key.into(), value.into()));
    }

    /// Remove a specific pair, or every pair with the key when `value`
    /// is `None`. Returns how many pairs were removed.
    pub fn remove(&mut self, key: &str, value: Option<&str>) -> usize {
        match value {
            Some(v) => {
                if self.pairs.remove(&(key.to_string(), v.to_string())) {
                    1
                } else {
                    0
                }
            }
            None => {
                let before = self.pairs.len();
                self.pairs.retain(|(k, _)| k != key);
                before - self.pairs.len()
            }
        }
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.pairs
            .contains(&(key.to_string(), value.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Freeze into an immutable snapshot.
    pub fn freeze(&self) -> ContextSet {
        ContextSet {
            pairs: self.pairs.clone(),
        }
    }
}

impl From<MutableContextSet> for ContextSet {
    fn from(m: MutableContextSet) -> Self {
        ContextSet { pairs: m.pairs }
    }
}
