//! # Warden Testkit
//!
//! ## Overview
//!
//! Shared testing utilities for the warden crates:
//!
//! - **Fixtures**: pre-built group hierarchies and node constructors
//!   for exercising resolution without boilerplate.
//! - **Generators**: proptest strategies for permission keys, context
//!   sets, and nodes.
//!
//! This crate is a dev-dependency only; it never ships in a release
//! build of the engine.

pub mod fixtures;
pub mod generators;

pub use fixtures::{deny, global, grant, group_ref, holder, TestFixture};
