//! # Warden Core
//!
//! Pure primitives for the Warden permission engine: context sets,
//! permission nodes, and node string normalization.
//!
//! This crate contains no I/O, no storage, no async. It is pure
//! computation over the permission data model.
//!
//! ## Key Types
//!
//! - [`Node`] - A single permission or metadata assertion
//! - [`NodeKind`] - Structured classification of a node
//! - [`ContextSet`] / [`MutableContextSet`] - Situational scope of a check or node
//! - [`Tristate`] - TRUE / FALSE / UNDEFINED check outcome
//!
//! ## Encoding
//!
//! Structured nodes are encoded as `.`-separated strings with reserved
//! first segments (`meta.`, `prefix.`, `group.` ...). See [`factory`].

pub mod context;
pub mod error;
pub mod factory;
pub mod node;
pub mod shorthand;
pub mod tristate;

pub use context::{ContextSet, MutableContextSet, SERVER_KEY, WORLD_KEY};
pub use error::{CoreError, Result};
pub use factory::from_string;
pub use node::{Node, NodeBuilder, NodeKind, PatternKind};
pub use tristate::Tristate;
