//! # Warden
//!
//! A permission resolution and node lifecycle engine.
//!
//! ## Overview
//!
//! Warden answers one question: "does subject X have permission Y in
//! context Z?" Subjects hold permission nodes, inherit more through
//! groups, and scope everything by contexts. The engine ties the model
//! together with pluggable storage, typed configuration, coalesced
//! background saves, and a command dispatch surface for host frontends.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warden::{Engine, EngineConfig};
//! use warden_core::{ContextSet, Tristate};
//! use warden_model::UserId;
//! use warden_store::MemoryStore;
//!
//! # async fn demo() -> warden::Result<()> {
//! let engine = Engine::new(MemoryStore::new(), EngineConfig::default());
//! engine.init().await?;
//!
//! let user = engine.get_or_load_user(UserId::random(), None).await?;
//! let answer = engine.check_permission(&user, "perms.fly", &ContextSet::empty());
//! assert_eq!(answer, Tristate::Undefined);
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod saving;

pub use commands::{execute, CommandContext, CommandKind, CommandResult, CommandTarget};
pub use config::{ConfigValue, EngineConfig};
pub use engine::{Engine, DEFAULT_GROUP};
pub use error::{EngineError, Result};
pub use saving::{SaveCoalescer, SaveKey};

// Re-export the layers the engine API surfaces.
pub use warden_core::{ContextSet, Node, NodeBuilder, NodeKind, Tristate};
pub use warden_model::{Group, Track, User, UserId};
pub use warden_store::{MemoryStore, SqliteStore, Store};
