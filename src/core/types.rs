//! core::types
//!
//! Strong types used throughout repomirror.
//!
//! # Types
//!
//! - [`RecordId`] - Primary key of a persisted record
//! - [`RefName`] - A validated Git reference name
//! - [`PushType`] - Regular, force, or force-with-lease
//! - [`RepoStatus`] / [`OperationStatus`] - Persisted lifecycle states
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Examples
//!
//! ```
//! use repomirror::core::types::{PushType, RefName};
//!
//! let refname = RefName::for_branch("main").unwrap();
//! assert_eq!(refname.as_str(), "refs/heads/main");
//! assert_eq!(refname.api_path(), "heads/main");
//!
//! assert_eq!("force-with-lease".parse::<PushType>().unwrap(), PushType::ForceWithLease);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid push type '{0}', must be one of: regular, force, force-with-lease")]
    InvalidPushType(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}

/// Primary key of a persisted record (repository or operation log entry).
///
/// Generated ids are UUIDv4 strings, but any non-empty string without
/// path separators is accepted so ids coming from callers round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a new unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create an id from an existing string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRecordId` for empty ids or ids that could
    /// escape the data directory when used as a file name.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidRecordId("id cannot be empty".into()));
        }
        if id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(TypeError::InvalidRecordId(format!(
                "'{}' contains a path separator",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated Git reference name (e.g., `refs/heads/main`).
///
/// GitHub's git-refs endpoints address references without the leading
/// `refs/`; [`RefName::api_path`] returns that form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name does not start with
    /// `refs/` or contains characters Git rejects.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Build the ref name for a branch (`refs/heads/<branch>`).
    pub fn for_branch(branch: &str) -> Result<Self, TypeError> {
        Self::new(format!("refs/heads/{}", branch))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let Some(rest) = name.strip_prefix("refs/") else {
            return Err(TypeError::InvalidRefName(format!(
                "'{}' must start with 'refs/'",
                name
            )));
        };
        if rest.is_empty() || rest.ends_with('/') || rest.ends_with(".lock") {
            return Err(TypeError::InvalidRefName(format!(
                "'{}' has an invalid final component",
                name
            )));
        }
        if rest.contains("..") || rest.contains("//") || rest.contains("@{") {
            return Err(TypeError::InvalidRefName(format!(
                "'{}' contains an invalid sequence",
                name
            )));
        }
        if let Some(c) = rest
            .chars()
            .find(|c| c.is_ascii_control() || " ~^:?*[\\".contains(*c))
        {
            return Err(TypeError::InvalidRefName(format!(
                "'{}' contains invalid character {:?}",
                name, c
            )));
        }
        Ok(())
    }

    /// Get the full ref name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The ref name without the leading `refs/`.
    pub fn api_path(&self) -> &str {
        self.0.strip_prefix("refs/").unwrap_or(&self.0)
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a push treats an existing target reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushType {
    /// Only fast-forward updates are allowed.
    #[default]
    Regular,
    /// Any update is allowed.
    Force,
    /// Forced update guarded by the last observed target SHA.
    ForceWithLease,
}

impl PushType {
    /// Wire name (`regular`, `force`, `force-with-lease`).
    pub fn as_str(&self) -> &'static str {
        match self {
            PushType::Regular => "regular",
            PushType::Force => "force",
            PushType::ForceWithLease => "force-with-lease",
        }
    }
}

impl FromStr for PushType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(PushType::Regular),
            "force" => Ok(PushType::Force),
            "force-with-lease" => Ok(PushType::ForceWithLease),
            other => Err(TypeError::InvalidPushType(other.to_string())),
        }
    }
}

impl std::fmt::Display for PushType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync status of a tracked repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    /// Registered, never pushed to.
    #[default]
    Pending,
    /// The most recent push to this repository succeeded.
    Synced,
}

impl std::fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoStatus::Pending => write!(f, "pending"),
            RepoStatus::Synced => write!(f, "synced"),
        }
    }
}

/// Lifecycle status of an operation log entry.
///
/// `Started` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Started,
    Completed,
    Failed,
}

impl OperationStatus {
    /// Check if the operation reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Failed)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Started => write!(f, "started"),
            OperationStatus::Completed => write!(f, "completed"),
            OperationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A UTC timestamp serialized as RFC3339.
///
/// # Example
///
/// ```
/// use repomirror::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC3339 string (as returned by the GitHub API).
    pub fn parse(s: &str) -> Option<Self> {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.with_timezone(&chrono::Utc)))
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
