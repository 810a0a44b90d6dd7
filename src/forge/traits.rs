//! forge::traits
//!
//! The `GitHost` trait and the Git data types it exchanges.
//!
//! # Design
//!
//! The trait is async because every operation is network I/O. Methods take
//! the repository they act on as a [`RepoSlug`] rather than binding one
//! repository per client, since a push reads from one repository and
//! writes to another with the same credentials.
//!
//! The surface mirrors GitHub's REST endpoints one-to-one: repository
//! metadata, branch and commit listings, the low-level git data API
//! (commits, trees, refs). Composite behavior (copying a commit, creating
//! or updating a ref) lives in `engine::sync`.
//!
//! # Example
//!
//! ```ignore
//! use repomirror::forge::GitHost;
//! use repomirror::core::url::RepoSlug;
//!
//! async fn newest(host: &dyn GitHost) -> Result<(), ForgeError> {
//!     let repo = RepoSlug::new("octocat", "hello-world");
//!     let commits = host.list_commits(&repo, 1).await?;
//!     println!("{:?}", commits.first().map(|c| &c.sha));
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::RefName;
use crate::core::url::RepoSlug;

/// Errors from forge operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// No token is configured.
    #[error("GitHub token not configured")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ForgeError {
    /// Whether this error means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// `owner/repo` as reported by the host
    pub full_name: String,
    /// Default branch name
    pub default_branch: String,
}

/// A branch as listed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub protected: bool,
    /// Commit the branch points at
    pub sha: String,
}

/// A commit as listed in a repository's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub message: String,
    /// Author date (RFC 3339)
    pub date: Option<String>,
    /// Author name
    pub author: Option<String>,
}

/// Author or committer identity on a git commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    /// RFC 3339 timestamp
    pub date: String,
}

/// A git commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    pub sha: String,
    pub message: String,
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
    pub tree_sha: String,
    pub parent_shas: Vec<String>,
}

impl GitCommit {
    /// The author date, if the host reported one.
    pub fn author_date(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.date.as_str())
    }
}

/// Kind of object a tree entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// A submodule (gitlink)
    Commit,
}

/// One entry of a git tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeEntry {
    pub path: String,
    /// File mode (e.g., `100644`, `040000`, `160000`)
    pub mode: String,
    pub kind: TreeEntryKind,
    pub sha: String,
}

/// A git tree, possibly listed recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub sha: String,
    pub entries: Vec<TreeEntry>,
    /// The host cut the listing short
    pub truncated: bool,
}

/// Request to create a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub message: String,
    pub tree_sha: String,
    pub parent_shas: Vec<String>,
    /// Author to record (host default when `None`)
    pub author: Option<Signature>,
    /// Committer to record (host default when `None`)
    pub committer: Option<Signature>,
}

/// A reference and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub name: RefName,
    pub sha: String,
}

/// A remote Git hosting service.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the HTTP endpoint shares one
/// client across requests.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: the token is missing or rejected
/// - `NotFound`: the repository, object or ref does not exist
/// - `ApiError`: validation failures (422), e.g. a non-fast-forward update
/// - `RateLimited` / `NetworkError`: transient, surfaced as-is (no retries)
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Get the host name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Get repository metadata.
    async fn get_repository(&self, repo: &RepoSlug) -> Result<RepoInfo, ForgeError>;

    /// List the repository's branches.
    async fn list_branches(&self, repo: &RepoSlug) -> Result<Vec<Branch>, ForgeError>;

    /// List the most recent commits of the default branch, newest first.
    ///
    /// An empty repository yields an empty list.
    async fn list_commits(
        &self,
        repo: &RepoSlug,
        per_page: u8,
    ) -> Result<Vec<CommitSummary>, ForgeError>;

    /// Get a git commit object.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the repository has no commit with this SHA
    async fn get_commit(&self, repo: &RepoSlug, sha: &str) -> Result<GitCommit, ForgeError>;

    /// Check whether the repository has a commit with this SHA.
    ///
    /// A not-found response means `false`; any other error is returned.
    async fn commit_exists(&self, repo: &RepoSlug, sha: &str) -> Result<bool, ForgeError> {
        match self.get_commit(repo, sha).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Get a tree, optionally listing all nested entries.
    async fn get_tree(
        &self,
        repo: &RepoSlug,
        sha: &str,
        recursive: bool,
    ) -> Result<Tree, ForgeError>;

    /// Create a tree from a flat list of entries; returns the tree SHA.
    async fn create_tree(
        &self,
        repo: &RepoSlug,
        entries: &[TreeEntry],
    ) -> Result<String, ForgeError>;

    /// Create a commit.
    async fn create_commit(
        &self,
        repo: &RepoSlug,
        commit: &NewCommit,
    ) -> Result<GitCommit, ForgeError>;

    /// Look up a reference.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the reference does not exist
    async fn get_ref(&self, repo: &RepoSlug, name: &RefName) -> Result<GitRef, ForgeError>;

    /// Create a reference pointing at `sha`.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if the reference already exists
    async fn create_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
    ) -> Result<GitRef, ForgeError>;

    /// Move a reference to `sha`.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if `force` is false and the update is
    ///   not a fast-forward
    async fn update_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, ForgeError>;
}
