//! core::records::store
//!
//! The record store interface.
//!
//! The store is a generic keyed table of repositories and operation log
//! entries: read by primary key, list, insert, and update by primary key.
//! Implementations must reject a status change on an operation log entry
//! that is already terminal, so the ledger stays monotonic even when two
//! writers race.

use thiserror::Error;

use super::schema::{OperationLogEntry, Repository};
use crate::core::types::{OperationStatus, RecordId};

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// I/O error reading or writing record files.
    #[error("record store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("record store json error: {0}")]
    Json(#[from] serde_json::Error),

    /// No record with the given primary key.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A record with the given primary key already exists.
    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    /// The operation log entry already reached a terminal status.
    #[error("operation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: OperationStatus,
        to: OperationStatus,
    },

    /// The store could not be locked for writing.
    #[error("record store is locked: {0}")]
    Locked(String),

    /// Write rejected by the store (backend-specific failure).
    #[error("record store write failed: {0}")]
    WriteFailed(String),
}

/// Keyed access to persisted records.
///
/// Implementations must be `Send + Sync`; the HTTP endpoint shares one
/// store across requests.
pub trait RecordStore: Send + Sync {
    /// Get a repository by id.
    fn get_repository(&self, id: &RecordId) -> Result<Option<Repository>, RecordError>;

    /// List all repositories, oldest registration first.
    fn list_repositories(&self) -> Result<Vec<Repository>, RecordError>;

    /// Insert a new repository.
    ///
    /// # Errors
    ///
    /// `RecordError::Duplicate` if the id is taken.
    fn insert_repository(&self, repo: &Repository) -> Result<(), RecordError>;

    /// Replace an existing repository row.
    ///
    /// # Errors
    ///
    /// `RecordError::NotFound` if no row has this id.
    fn update_repository(&self, repo: &Repository) -> Result<(), RecordError>;

    /// Get an operation log entry by id.
    fn get_operation(&self, id: &RecordId) -> Result<Option<OperationLogEntry>, RecordError>;

    /// List operation log entries, most recently started first.
    fn list_operations(&self) -> Result<Vec<OperationLogEntry>, RecordError>;

    /// Insert a new operation log entry.
    fn insert_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError>;

    /// Replace an existing operation log entry.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if no entry has this id
    /// - `RecordError::InvalidTransition` if the stored entry is terminal
    fn update_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError>;
}

/// Sort operation log entries newest first.
pub(crate) fn newest_first(entries: &mut [OperationLogEntry]) {
    entries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
}
