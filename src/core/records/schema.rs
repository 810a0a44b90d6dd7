//! core::records::schema
//!
//! Persisted record types: tracked repositories and operation log entries.
//!
//! # Lifecycle
//!
//! - A [`Repository`] is created when a URL is registered and updated after
//!   each successful push. The core never deletes one.
//! - An [`OperationLogEntry`] is created as `started` when a push begins and
//!   transitions exactly once to `completed` or `failed`.
//!
//! Field names serialize in camelCase, which is also what the HTTP
//! endpoint returns.

use serde::{Deserialize, Serialize};

use super::store::RecordError;
use crate::core::types::{OperationStatus, PushType, RecordId, RepoStatus, UtcTimestamp};
use crate::core::url::RepoSlug;

/// A tracked GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: RecordId,
    pub url: String,
    /// `owner/repo`, derived from the URL at registration.
    pub name: String,
    pub default_branch: Option<String>,
    pub last_commit_sha: Option<String>,
    /// What the last push set the target branch to. Differs from
    /// `last_commit_sha` when the host rewrote the copied commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pushed_sha: Option<String>,
    pub last_commit_date: Option<UtcTimestamp>,
    pub last_synced_at: Option<UtcTimestamp>,
    pub status: RepoStatus,
    pub created_at: UtcTimestamp,
}

impl Repository {
    /// Create a new `pending` repository row for a registered URL.
    pub fn register(url: impl Into<String>, slug: &RepoSlug) -> Self {
        Self {
            id: RecordId::generate(),
            url: url.into(),
            name: slug.to_string(),
            default_branch: None,
            last_commit_sha: None,
            last_pushed_sha: None,
            last_commit_date: None,
            last_synced_at: None,
            status: RepoStatus::Pending,
            created_at: UtcTimestamp::now(),
        }
    }

    /// Same as [`Repository::register`] with a caller-chosen id.
    pub fn with_id(id: RecordId, url: impl Into<String>, slug: &RepoSlug) -> Self {
        Self {
            id,
            ..Self::register(url, slug)
        }
    }

    /// Record the outcome of a successful push to this repository.
    ///
    /// `commit_sha` is the source commit; `pushed_sha` is what the target
    /// branch now points at.
    pub fn mark_synced(
        &mut self,
        commit_sha: impl Into<String>,
        pushed_sha: impl Into<String>,
        commit_date: Option<UtcTimestamp>,
    ) {
        self.last_commit_sha = Some(commit_sha.into());
        self.last_pushed_sha = Some(pushed_sha.into());
        self.last_commit_date = commit_date;
        self.last_synced_at = Some(UtcTimestamp::now());
        self.status = RepoStatus::Synced;
    }

    /// The SHA a force-with-lease push expects the target branch to hold.
    ///
    /// Rows never pushed to fall back to the commit seen at registration.
    pub fn lease(&self) -> Option<&str> {
        self.last_pushed_sha
            .as_deref()
            .or(self.last_commit_sha.as_deref())
    }

    /// The default branch, or `fallback` when none is recorded.
    pub fn target_branch_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.default_branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(fallback)
    }
}

/// Kind of operation recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    #[default]
    Push,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Push => write!(f, "push"),
        }
    }
}

/// One push attempt and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLogEntry {
    pub id: RecordId,
    pub source_repo_id: RecordId,
    pub target_repo_id: RecordId,
    pub operation_type: OperationType,
    pub push_type: PushType,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: UtcTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<UtcTimestamp>,
}

impl OperationLogEntry {
    /// A new `started` push entry.
    pub fn start(source_repo_id: RecordId, target_repo_id: RecordId, push_type: PushType) -> Self {
        Self {
            id: RecordId::generate(),
            source_repo_id,
            target_repo_id,
            operation_type: OperationType::Push,
            push_type,
            status: OperationStatus::Started,
            commit_hash: None,
            error_message: None,
            started_at: UtcTimestamp::now(),
            completed_at: None,
        }
    }

    /// Transition to `completed`.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidTransition` if the entry is already terminal.
    pub fn complete(&mut self, commit_hash: impl Into<String>) -> Result<(), RecordError> {
        self.ensure_transition(OperationStatus::Completed)?;
        self.status = OperationStatus::Completed;
        self.commit_hash = Some(commit_hash.into());
        self.completed_at = Some(UtcTimestamp::now());
        Ok(())
    }

    /// Transition to `failed`.
    ///
    /// An empty message is replaced with a generic one so failed entries
    /// always carry an error message.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidTransition` if the entry is already terminal.
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), RecordError> {
        self.ensure_transition(OperationStatus::Failed)?;
        let message = error_message.into();
        self.status = OperationStatus::Failed;
        self.error_message = Some(if message.trim().is_empty() {
            "Unknown error occurred".to_string()
        } else {
            message
        });
        self.completed_at = Some(UtcTimestamp::now());
        Ok(())
    }

    fn ensure_transition(&self, to: OperationStatus) -> Result<(), RecordError> {
        check_transition(&self.id, self.status, to)
    }
}

/// Validate a status change of an operation log entry.
///
/// Only `started -> completed|failed` (or an idempotent `started -> started`)
/// is allowed.
pub fn check_transition(
    id: &RecordId,
    from: OperationStatus,
    to: OperationStatus,
) -> Result<(), RecordError> {
    if from.is_terminal() {
        return Err(RecordError::InvalidTransition {
            id: id.to_string(),
            from,
            to,
        });
    }
    Ok(())
}
