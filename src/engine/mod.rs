//! engine
//!
//! Mirrors commits between GitHub repositories and records what happened.
//!
//! # Architecture
//!
//! ```text
//! PushOrchestrator
//!   |-- Ledger          operation log entries (started -> completed | failed)
//!   |-- details         default branch, branches, recent commits
//!   `-- Synchronizer    copy commit into target, point ref at it
//! ```
//!
//! Every step appends to an [`AuditTrail`] that is returned with the result
//! or the error, so callers can show what happened. The trail is
//! separate from process logging; each entry is also emitted via `tracing`.
//!
//! # Invariants
//!
//! - Unknown repository ids fail before any upstream call
//! - Every ledger entry ends `completed` or `failed`, except when the
//!   process dies between the ref update and the final writes
//! - A regular push never rewrites target history
//!
//! # Example
//!
//! ```ignore
//! use repomirror::engine::{EngineOptions, PushOrchestrator, PushRequest};
//!
//! let orchestrator = PushOrchestrator::new(&store, &host, EngineOptions::default());
//! match orchestrator.push(&request).await {
//!     Ok(traced) => println!("pushed {}", traced.value.commit_sha),
//!     Err(failed) => eprintln!("{} ({} log entries)", failed.error, failed.trail.len()),
//! }
//! ```

pub mod analyze;
pub mod audit;
pub mod details;
pub mod errors;
pub mod ledger;
pub mod push;
pub mod sync;

// Test-only hook for crash simulation between the ref update and the
// record writes. Available under cfg(test), or the fault_injection feature
// for integration tests.
#[cfg(any(test, feature = "fault_injection"))]
pub mod engine_hooks;

pub use analyze::Analyzer;
pub use audit::{AuditTrail, LogEntry, LogKind, Traced, TracedError};
pub use details::{fetch_repo_details, RepoDetails};
pub use errors::PushError;
pub use ledger::Ledger;
pub use push::{PushOrchestrator, PushOutcome, PushRequest};
pub use sync::{RefOutcome, RefUpdate, Synchronizer};

use crate::core::config::{Config, DEFAULT_BRANCH, DEFAULT_COMMIT_HISTORY_DEPTH};

/// Settings the engine reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Number of recent commits fetched per details request.
    pub commit_history_depth: u8,
    /// Branch pushed to when the target has no recorded default branch.
    pub default_branch: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            commit_history_depth: DEFAULT_COMMIT_HISTORY_DEPTH,
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            commit_history_depth: config.commit_history_depth(),
            default_branch: config.default_branch().to_string(),
        }
    }
}
