//! Datastore configuration and backend construction.
//!
//! Backend construction is the one place where a storage failure is
//! fatal: a store that cannot open leaves the engine with nothing to
//! run on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::split::{Section, SplitStore};
use crate::sqlite::SqliteStore;
use crate::traits::Store;

const SQLITE_FILE: &str = "warden.sqlite";

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMethod {
    Memory,
    File,
    Sqlite,
}

impl StorageMethod {
    /// Lenient name lookup, accepting the common aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "file" | "json" | "flatfile" => Some(Self::File),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Datastore configuration: a default method, the data directory, and
/// optional per-section overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub method: StorageMethod,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<BTreeMap<Section, StorageMethod>>,
}

impl StorageConfig {
    pub fn new(method: StorageMethod, path: impl Into<PathBuf>) -> Self {
        Self {
            method,
            path: path.into(),
            split: None,
        }
    }

    pub fn with_split(mut self, section: Section, method: StorageMethod) -> Self {
        self.split
            .get_or_insert_with(BTreeMap::new)
            .insert(section, method);
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(StorageMethod::Sqlite, "warden-data")
    }
}

/// Build the composed store described by the configuration.
///
/// Backends are shared: two sections routed to the same method use one
/// instance.
pub fn build_store(config: &StorageConfig) -> Result<SplitStore> {
    let mut cache: BTreeMap<StorageMethod, Arc<dyn Store>> = BTreeMap::new();

    let default = backend_for(&mut cache, config.method, &config.path)?;
    let mut store = SplitStore::uniform(default);

    if let Some(split) = &config.split {
        for (&section, &method) in split {
            info!(%section, ?method, "routing storage section");
            let backend = backend_for(&mut cache, method, &config.path)?;
            store = store.with_section(section, backend);
        }
    }

    Ok(store)
}

fn backend_for(
    cache: &mut BTreeMap<StorageMethod, Arc<dyn Store>>,
    method: StorageMethod,
    path: &Path,
) -> Result<Arc<dyn Store>> {
    if let Some(existing) = cache.get(&method) {
        return Ok(existing.clone());
    }

    let backend: Arc<dyn Store> = match method {
        StorageMethod::Memory => Arc::new(MemoryStore::new()),
        StorageMethod::File => Arc::new(FileStore::open(path)?),
        StorageMethod::Sqlite => {
            fs::create_dir_all(path)?;
            Arc::new(SqliteStore::open(path.join(SQLITE_FILE))?)
        }
    };

    cache.insert(method, backend.clone());
    Ok(backend)
}
