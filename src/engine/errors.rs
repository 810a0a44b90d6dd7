//! engine::errors
//!
//! The error taxonomy of push and analysis operations.

use thiserror::Error;

use crate::core::records::RecordError;
use crate::core::types::RecordId;
use crate::core::url::InvalidUrl;
use crate::forge::ForgeError;

/// Errors from push and analysis operations.
///
/// The `Display` text is what lands in an operation log entry's
/// `errorMessage` and in the `error` field of the HTTP failure envelope.
#[derive(Debug, Error)]
pub enum PushError {
    /// A repository URL does not name a GitHub repository.
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),

    /// The source or target repository row does not exist.
    #[error("Repository not found: {0}")]
    RepositoryNotFound(RecordId),

    /// The source repository has no commits.
    #[error("No commits found in source repository")]
    NoCommits,

    /// The Git host rejected or failed a call.
    #[error(transparent)]
    UpstreamApi(#[from] ForgeError),

    /// The record store failed.
    #[error(transparent)]
    Persistence(#[from] RecordError),

    /// The target reference moved since it was last recorded.
    #[error("Reference {ref_name} moved: expected {expected}, found {actual}")]
    LeaseMismatch {
        ref_name: String,
        expected: String,
        actual: String,
    },

    /// The request itself is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PushError {
    /// Whether the caller sent something unusable (as opposed to a
    /// failure while carrying out a valid request).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PushError::InvalidRequest(_) | PushError::InvalidUrl(_))
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            PushError::InvalidUrl(_) => "invalid_url",
            PushError::RepositoryNotFound(_) => "repository_not_found",
            PushError::NoCommits => "no_commits",
            PushError::UpstreamApi(_) => "upstream_api",
            PushError::Persistence(_) => "persistence",
            PushError::LeaseMismatch { .. } => "lease_mismatch",
            PushError::InvalidRequest(_) => "invalid_request",
        }
    }
}
