//! Engine configuration.
//!
//! Configuration is a typed struct: every recognized option is a plain
//! field with a default, constructed programmatically by the embedding
//! application. The stringly-typed `unsafe_get` escape hatch exists for
//! diagnostic surfaces that need to read options by their wire name; it
//! answers only from the recognized key table plus the explicit extras
//! map, and unknown keys are a hard error rather than a silent default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use warden_model::{ResolverSettings, TemporaryMergeBehaviour};
use warden_store::StorageConfig;

use crate::error::{EngineError, Result};

/// A dynamically typed configuration value, as returned by `unsafe_get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    String(String),
    Map(BTreeMap<String, String>),
}

/// Typed engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name of this server in context queries.
    pub server: String,
    /// Minutes between full storage syncs; negative disables.
    pub sync_time: i64,
    /// Apply server-global permissions in server-scoped queries.
    pub include_global_perms: bool,
    /// Apply world-global permissions in world-scoped queries.
    pub include_global_world_perms: bool,
    /// Follow server-global group memberships in server-scoped queries.
    pub apply_global_groups: bool,
    /// Follow world-global group memberships in world-scoped queries.
    pub apply_global_world_groups: bool,
    /// Apply wildcard nodes.
    pub apply_wildcards: bool,
    /// Apply regex nodes.
    pub apply_regex: bool,
    /// Expand shorthand nodes.
    pub apply_shorthand: bool,
    /// An explicit negative outranks an equal-rank positive.
    pub negation_authoritative: bool,
    /// Merge policy when setting a temporary node that already exists.
    pub temporary_add_behaviour: TemporaryMergeBehaviour,
    /// Datastore configuration.
    pub storage: StorageConfig,
    /// Options outside the recognized table, kept verbatim.
    pub extra: BTreeMap<String, ConfigValue>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: "global".to_string(),
            sync_time: -1,
            include_global_perms: true,
            include_global_world_perms: true,
            apply_global_groups: true,
            apply_global_world_groups: true,
            apply_wildcards: true,
            apply_regex: true,
            apply_shorthand: true,
            negation_authoritative: true,
            temporary_add_behaviour: TemporaryMergeBehaviour::default(),
            storage: StorageConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// The resolver flags this configuration implies.
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            apply_wildcards: self.apply_wildcards,
            apply_regex: self.apply_regex,
            apply_shorthand: self.apply_shorthand,
            include_global_perms: self.include_global_perms,
            include_global_world_perms: self.include_global_world_perms,
            apply_global_groups: self.apply_global_groups,
            apply_global_world_groups: self.apply_global_world_groups,
            negation_authoritative: self.negation_authoritative,
        }
    }

    /// Read an option by its wire name.
    ///
    /// "Unsafe" refers to the loss of typing, not memory safety: callers
    /// get a dynamically typed value and must interpret it themselves.
    /// Unknown keys are an error, never a default.
    pub fn unsafe_get(&self, key: &str) -> Result<ConfigValue> {
        let value = match key {
            "server" => ConfigValue::String(self.server.clone()),
            "sync-time" => ConfigValue::Int(self.sync_time),
            "include-global" => ConfigValue::Bool(self.include_global_perms),
            "include-global-world" => ConfigValue::Bool(self.include_global_world_perms),
            "apply-global-groups" => ConfigValue::Bool(self.apply_global_groups),
            "apply-global-world-groups" => ConfigValue::Bool(self.apply_global_world_groups),
            "apply-wildcards" => ConfigValue::Bool(self.apply_wildcards),
            "apply-regex" => ConfigValue::Bool(self.apply_regex),
            "apply-shorthand" => ConfigValue::Bool(self.apply_shorthand),
            "negation-authoritative" => ConfigValue::Bool(self.negation_authoritative),
            "temporary-add-behaviour" => {
                ConfigValue::String(format!("{:?}", self.temporary_add_behaviour).to_lowercase())
            }
            "storage-method" => {
                ConfigValue::String(format!("{:?}", self.storage.method).to_lowercase())
            }
            "split-storage" => {
                let map = self
                    .storage
                    .split
                    .iter()
                    .flatten()
                    .map(|(section, method)| {
                        (section.to_string(), format!("{:?}", method).to_lowercase())
                    })
                    .collect();
                ConfigValue::Map(map)
            }
            other => {
                return self
                    .extra
                    .get(other)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownConfigKey(other.to_string()));
            }
        };
        Ok(value)
    }
}
