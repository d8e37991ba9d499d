//! # Warden Store
//!
//! Storage backends for the permission engine.
//!
//! ## Overview
//!
//! Persistence is snapshot-based: the engine hands a whole holder to the
//! store, and the store replaces whatever it held before. Three backends
//! implement the same async `Store` trait, and a `SplitStore` can route
//! each data section to a different one.
//!
//! ## Key Concepts
//!
//! - **Store**: The async persistence trait the engine programs against
//! - **Snapshots**: Plain serde structs carrying holder state
//! - **MemoryStore**: Ephemeral, for tests
//! - **FileStore**: JSON documents with atomic rename writes
//! - **SqliteStore**: The primary backend; rusqlite behind
//!   `spawn_blocking`, node lists as CBOR blobs
//! - **SplitStore**: Per-section routing built from `StorageConfig`

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod migration;
pub mod snapshot;
pub mod split;
pub mod sqlite;
pub mod traits;

pub use config::{build_store, StorageConfig, StorageMethod};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use snapshot::{ActionLogEntry, GroupSnapshot, NodeRecord, TrackSnapshot, UserSnapshot};
pub use split::{Section, SplitStore};
pub use sqlite::SqliteStore;
pub use traits::Store;
