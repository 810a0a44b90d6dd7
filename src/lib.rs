//! repomirror - mirror the latest commit of one GitHub repository onto
//! another.
//!
//! A push takes the most recent commit of a tracked source repository,
//! makes sure the commit exists in a tracked target repository, and points
//! the target's default branch at it. Every attempt is recorded in an
//! operation log and returns an ordered audit trail of what happened.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`server`] - HTTP endpoint (axum) over the same engine
//! - [`engine`] - Push orchestration, repository analysis, audit trail
//! - [`forge`] - GitHub REST API client behind the [`forge::GitHost`] trait
//! - [`core`] - Domain types, URL parsing, configuration, record storage
//! - [`secrets`] - Token storage and resolution
//! - [`telemetry`] - Process logging setup
//! - [`ui`] - Terminal output
//!
//! # Correctness Invariants
//!
//! 1. Unknown repository ids fail before any call to GitHub
//! 2. Operation log entries reach `completed` or `failed` exactly once
//! 3. A regular push never rewrites target history

pub mod cli;
pub mod core;
pub mod engine;
pub mod forge;
pub mod secrets;
pub mod server;
pub mod telemetry;
pub mod ui;
