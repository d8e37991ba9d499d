//! # Warden Model
//!
//! Permission holders, inheritance, and the resolution algorithm.
//!
//! ## Overview
//!
//! The model crate owns the subject types (users, groups, tracks), the
//! holder collection with its overwrite-on-set semantics, and the
//! resolver that flattens a holder's inheritance closure into an
//! effective tristate answer for any permission query.
//!
//! ## Key Concepts
//!
//! - **PermissionHolder**: An owned node collection with at most one
//!   node per (key, contexts) identity
//! - **User / Group / Track**: The three subject kinds; users inherit
//!   from groups, tracks order groups into promotion ladders
//! - **Registries**: Process-wide shared maps of loaded holders,
//!   each behind its own `RwLock`
//! - **Resolver**: Breadth-first inheritance walk with cycle
//!   protection, pattern expansion, and rank-based precedence
//!
//! ## Usage
//!
//! ```rust
//! use warden_core::{ContextSet, Node, Tristate};
//! use warden_model::{Group, GroupRegistry, PermissionHolder, Resolver, ResolverSettings};
//!
//! let groups = GroupRegistry::new();
//! let mut admin = Group::new("admin");
//! admin
//!     .holder_mut()
//!     .set_permission(Node::permission("perms.build").build().unwrap(), 0);
//! groups.insert(admin);
//!
//! let mut holder = PermissionHolder::new();
//! holder.set_permission(Node::group("admin").build().unwrap(), 0);
//!
//! let resolver = Resolver::new(ResolverSettings::default(), &groups);
//! let out = resolver.resolve_permission(&holder, "perms.build", &ContextSet::empty(), 0);
//! assert_eq!(out, Tristate::True);
//! ```

pub mod error;
pub mod group;
pub mod holder;
pub mod registry;
pub mod resolver;
pub mod temporary;
pub mod track;
pub mod user;

pub use error::{ModelError, Result};
pub use group::Group;
pub use holder::{NodeEntry, PermissionHolder, SetOutcome, UnsetOutcome};
pub use registry::{GroupRef, GroupRegistry, TrackRef, TrackRegistry, UserRef, UserRegistry};
pub use resolver::{Resolver, ResolverSettings};
pub use temporary::TemporaryMergeBehaviour;
pub use track::Track;
pub use user::{User, UserId};
