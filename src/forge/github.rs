//! forge::github
//!
//! GitHub implementation of [`GitHost`] over the REST API.
//!
//! # Design
//!
//! One client serves every repository; each call names its repository.
//! Git objects go through the git data endpoints (`/git/commits`,
//! `/git/trees`, `/git/refs`), listings through the repository endpoints.
//!
//! # Rate Limiting
//!
//! Returns `ForgeError::RateLimited` when limits are hit. There is no
//! automatic retry; a push surfaces the failure and is re-run by the caller.
//!
//! # Example
//!
//! ```ignore
//! use repomirror::forge::github::GitHubForge;
//! use repomirror::forge::GitHost;
//! use repomirror::core::url::RepoSlug;
//!
//! let forge = GitHubForge::new(token);
//! let info = forge.get_repository(&RepoSlug::new("octocat", "hello-world")).await?;
//! println!("default branch: {}", info.default_branch);
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    Branch, CommitSummary, ForgeError, GitCommit, GitHost, GitRef, NewCommit, RepoInfo,
    Signature, Tree, TreeEntry, TreeEntryKind,
};
use crate::core::config::DEFAULT_API_BASE;
use crate::core::types::RefName;
use crate::core::url::RepoSlug;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("repomirror/", env!("CARGO_PKG_VERSION"));

/// GitHub REST client.
pub struct GitHubForge {
    client: Client,
    token: String,
    /// API base URL (configurable for GitHub Enterprise and tests)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a client for api.github.com.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a client for a custom API base (GitHub Enterprise, test servers).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// The API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        if self.token.is_empty() {
            return Err(ForgeError::AuthRequired);
        }
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, repo.owner, repo.repo, path
        )
    }

    /// Attach headers, send, and decode.
    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ForgeError> {
        let response = request
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "github response");

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(self.error_from_response(response, status).await)
        }
    }

    /// Map an error response from the API.
    async fn error_from_response(&self, response: Response, status: StatusCode) -> ForgeError {
        let required_permissions = response
            .headers()
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Try to get error message from body
        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN if is_rate_limit_message(&message) => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// GitHub reports primary rate limits as 403 with this message.
fn is_rate_limit_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}

#[async_trait]
impl GitHost for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get_repository(&self, repo: &RepoSlug) -> Result<RepoInfo, ForgeError> {
        let url = format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.repo);
        let gh: GitHubRepository = self.send(self.client.get(&url)).await?;
        Ok(RepoInfo {
            full_name: gh.full_name,
            default_branch: gh.default_branch,
        })
    }

    async fn list_branches(&self, repo: &RepoSlug) -> Result<Vec<Branch>, ForgeError> {
        let url = self.repo_url(repo, "branches?per_page=100");
        let branches: Vec<GitHubBranch> = self.send(self.client.get(&url)).await?;
        Ok(branches.into_iter().map(Branch::from).collect())
    }

    async fn list_commits(
        &self,
        repo: &RepoSlug,
        per_page: u8,
    ) -> Result<Vec<CommitSummary>, ForgeError> {
        let url = self.repo_url(repo, &format!("commits?per_page={}", per_page));
        let result: Result<Vec<GitHubCommitListItem>, ForgeError> =
            self.send(self.client.get(&url)).await;

        match result {
            Ok(commits) => Ok(commits.into_iter().map(CommitSummary::from).collect()),
            // "Git Repository is empty."
            Err(ForgeError::ApiError { status: 409, .. }) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    async fn get_commit(&self, repo: &RepoSlug, sha: &str) -> Result<GitCommit, ForgeError> {
        let url = self.repo_url(repo, &format!("git/commits/{}", sha));
        let gh: GitHubGitCommit = self.send(self.client.get(&url)).await?;
        Ok(gh.into())
    }

    async fn get_tree(
        &self,
        repo: &RepoSlug,
        sha: &str,
        recursive: bool,
    ) -> Result<Tree, ForgeError> {
        let path = if recursive {
            format!("git/trees/{}?recursive=1", sha)
        } else {
            format!("git/trees/{}", sha)
        };
        let url = self.repo_url(repo, &path);
        let gh: GitHubTree = self.send(self.client.get(&url)).await?;
        Ok(Tree {
            sha: gh.sha,
            entries: gh.tree.into_iter().map(TreeEntry::from).collect(),
            truncated: gh.truncated,
        })
    }

    async fn create_tree(
        &self,
        repo: &RepoSlug,
        entries: &[TreeEntry],
    ) -> Result<String, ForgeError> {
        let url = self.repo_url(repo, "git/trees");
        let body = CreateTreeBody {
            tree: entries.iter().map(CreateTreeEntry::from).collect(),
        };
        let created: GitHubTreeSha = self.send(self.client.post(&url).json(&body)).await?;
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoSlug,
        commit: &NewCommit,
    ) -> Result<GitCommit, ForgeError> {
        let url = self.repo_url(repo, "git/commits");
        let body = CreateCommitBody {
            message: &commit.message,
            tree: &commit.tree_sha,
            parents: &commit.parent_shas,
            author: commit.author.as_ref(),
            committer: commit.committer.as_ref(),
        };
        let gh: GitHubGitCommit = self.send(self.client.post(&url).json(&body)).await?;
        Ok(gh.into())
    }

    async fn get_ref(&self, repo: &RepoSlug, name: &RefName) -> Result<GitRef, ForgeError> {
        let url = self.repo_url(repo, &format!("git/ref/{}", name.api_path()));
        let gh: GitHubRef = self.send(self.client.get(&url)).await?;
        gh.try_into()
    }

    async fn create_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
    ) -> Result<GitRef, ForgeError> {
        let url = self.repo_url(repo, "git/refs");
        let body = CreateRefBody {
            ref_name: name.as_str(),
            sha,
        };
        let gh: GitHubRef = self.send(self.client.post(&url).json(&body)).await?;
        gh.try_into()
    }

    async fn update_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
        force: bool,
    ) -> Result<GitRef, ForgeError> {
        let url = self.repo_url(repo, &format!("git/refs/{}", name.api_path()));
        let body = UpdateRefBody { sha, force };
        let gh: GitHubRef = self.send(self.client.patch(&url).json(&body)).await?;
        gh.try_into()
    }
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Serialize)]
struct CreateTreeBody<'a> {
    tree: Vec<CreateTreeEntry<'a>>,
}

#[derive(Serialize)]
struct CreateTreeEntry<'a> {
    path: &'a str,
    mode: &'a str,
    #[serde(rename = "type")]
    kind: TreeEntryKind,
    sha: &'a str,
}

impl<'a> From<&'a TreeEntry> for CreateTreeEntry<'a> {
    fn from(e: &'a TreeEntry) -> Self {
        Self {
            path: &e.path,
            mode: &e.mode,
            kind: e.kind,
            sha: &e.sha,
        }
    }
}

#[derive(Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a Signature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a Signature>,
}

#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

#[derive(Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

// =============================================================================
// Response formats
// =============================================================================

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

#[derive(Deserialize)]
struct GitHubRepository {
    full_name: String,
    default_branch: String,
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
    #[serde(default)]
    protected: bool,
    commit: GitHubShaOnly,
}

impl From<GitHubBranch> for Branch {
    fn from(gh: GitHubBranch) -> Self {
        Branch {
            name: gh.name,
            protected: gh.protected,
            sha: gh.commit.sha,
        }
    }
}

#[derive(Deserialize)]
struct GitHubShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubCommitListItem {
    sha: String,
    commit: GitHubCommitListDetail,
}

#[derive(Deserialize)]
struct GitHubCommitListDetail {
    message: String,
    author: Option<GitHubPartialSignature>,
}

/// Signature as it appears in listings (fields may be absent).
#[derive(Deserialize)]
struct GitHubPartialSignature {
    name: Option<String>,
    date: Option<String>,
}

impl From<GitHubCommitListItem> for CommitSummary {
    fn from(gh: GitHubCommitListItem) -> Self {
        let (author, date) = match gh.commit.author {
            Some(a) => (a.name, a.date),
            None => (None, None),
        };
        CommitSummary {
            sha: gh.sha,
            message: gh.commit.message,
            date,
            author,
        }
    }
}

#[derive(Deserialize)]
struct GitHubGitCommit {
    sha: String,
    message: String,
    author: Option<Signature>,
    committer: Option<Signature>,
    tree: GitHubShaOnly,
    #[serde(default)]
    parents: Vec<GitHubShaOnly>,
}

impl From<GitHubGitCommit> for GitCommit {
    fn from(gh: GitHubGitCommit) -> Self {
        GitCommit {
            sha: gh.sha,
            message: gh.message,
            author: gh.author,
            committer: gh.committer,
            tree_sha: gh.tree.sha,
            parent_shas: gh.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

#[derive(Deserialize)]
struct GitHubTree {
    sha: String,
    tree: Vec<GitHubTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct GitHubTreeEntry {
    path: String,
    mode: String,
    #[serde(rename = "type")]
    kind: TreeEntryKind,
    sha: String,
}

impl From<GitHubTreeEntry> for TreeEntry {
    fn from(gh: GitHubTreeEntry) -> Self {
        TreeEntry {
            path: gh.path,
            mode: gh.mode,
            kind: gh.kind,
            sha: gh.sha,
        }
    }
}

#[derive(Deserialize)]
struct GitHubTreeSha {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubShaOnly,
}

impl TryFrom<GitHubRef> for GitRef {
    type Error = ForgeError;

    fn try_from(gh: GitHubRef) -> Result<Self, Self::Error> {
        let name = RefName::new(gh.ref_name).map_err(|e| ForgeError::ApiError {
            status: 200,
            message: format!("Failed to parse response: {}", e),
        })?;
        Ok(GitRef {
            name,
            sha: gh.object.sha,
        })
    }
}
