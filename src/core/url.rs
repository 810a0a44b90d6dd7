//! core::url
//!
//! Extraction of `{owner, repo}` from GitHub repository URLs.
//!
//! Accepted forms:
//! - `https://github.com/owner/repo` (any scheme or prefix before `github.com/`)
//! - `https://github.com/owner/repo.git`
//! - `git@github.com:owner/repo.git`, optionally after `ssh://`
//!
//! The colon form is only recognized at the start of the string, and
//! nothing after `?` or `#` is searched. Only a trailing `.git` is
//! stripped; case and scheme are left alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The URL did not contain `github.com/<owner>/<repo>`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid GitHub URL: {0}")]
pub struct InvalidUrl(pub String);

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

const SSH_PREFIXES: [&str; 2] = ["git@github.com:", "ssh://git@github.com:"];

/// Parse a GitHub URL into a [`RepoSlug`].
///
/// # Example
///
/// ```
/// use repomirror::core::url::parse_github_url;
///
/// let slug = parse_github_url("https://github.com/octocat/hello-world.git").unwrap();
/// assert_eq!(slug.owner, "octocat");
/// assert_eq!(slug.repo, "hello-world");
///
/// assert!(parse_github_url("https://gitlab.com/octocat/hello-world").is_err());
/// ```
pub fn parse_github_url(url: &str) -> Result<RepoSlug, InvalidUrl> {
    let invalid = || InvalidUrl(url.to_string());

    let path = url.split(['?', '#']).next().unwrap_or_default();
    let rest = if let Some(rest) = SSH_PREFIXES.iter().find_map(|p| path.strip_prefix(*p)) {
        rest
    } else if let Some(idx) = path.find("github.com/") {
        &path[idx + "github.com/".len()..]
    } else {
        return Err(invalid());
    };

    let mut segments = rest.split('/');

    let owner = segments.next().unwrap_or_default();
    let repo = segments.next().unwrap_or_default();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    if owner.is_empty() || repo.is_empty() || owner.contains(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(RepoSlug::new(owner, repo))
}
