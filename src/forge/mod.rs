//! forge
//!
//! Abstraction over the remote Git host (GitHub).
//!
//! # Architecture
//!
//! The [`GitHost`] trait is the only way the engine talks to the network.
//! Production code uses [`github::GitHubForge`]; tests use
//! [`mock::MockForge`], which simulates repositories, commits and refs
//! in memory.
//!
//! # Modules
//!
//! - `traits`: The `GitHost` trait and git data types
//! - [`github`]: GitHub REST implementation
//! - [`mock`]: In-memory implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
