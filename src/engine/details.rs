//! engine::details
//!
//! Fetches what the dashboard shows about a repository: default branch,
//! branches, and the most recent commits.
//!
//! The three reads are independent and issued concurrently; the first
//! failure aborts the whole fetch. There are no partial results.

use serde::Serialize;
use serde_json::json;

use super::audit::AuditTrail;
use super::errors::PushError;
use crate::core::url::{parse_github_url, RepoSlug};
use crate::forge::{Branch, CommitSummary, GitHost};

/// Aggregated repository details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDetails {
    #[serde(flatten)]
    pub slug: RepoSlug,
    pub default_branch: String,
    pub branches: Vec<Branch>,
    /// Newest first
    pub last_commits: Vec<CommitSummary>,
}

impl RepoDetails {
    /// The most recent commit, if the repository has any.
    pub fn latest_commit(&self) -> Option<&CommitSummary> {
        self.last_commits.first()
    }
}

/// Fetch details for the repository at `url`.
///
/// `depth` is the number of recent commits to list.
///
/// # Errors
///
/// - `PushError::InvalidUrl` if `url` does not name a GitHub repository
/// - `PushError::UpstreamApi` if any of the three reads fails
pub async fn fetch_repo_details(
    host: &dyn GitHost,
    url: &str,
    depth: u8,
    trail: &mut AuditTrail,
) -> Result<RepoDetails, PushError> {
    trail.info_with("Starting repository details fetch", json!({ "url": url }));

    let slug = match parse_github_url(url) {
        Ok(slug) => slug,
        Err(e) => {
            trail.error("Error fetching repository details", &e);
            return Err(e.into());
        }
    };
    trail.info_with(
        "Parsed GitHub URL",
        json!({ "owner": slug.owner, "repo": slug.repo }),
    );

    let fetched = tokio::try_join!(
        host.get_repository(&slug),
        host.list_branches(&slug),
        host.list_commits(&slug, depth),
    );

    match fetched {
        Ok((info, branches, last_commits)) => {
            trail.success_with(
                "Repository details fetched successfully",
                json!({
                    "defaultBranch": info.default_branch,
                    "branchCount": branches.len(),
                    "commitCount": last_commits.len(),
                }),
            );
            Ok(RepoDetails {
                slug,
                default_branch: info.default_branch,
                branches,
                last_commits,
            })
        }
        Err(e) => {
            trail.error("Error fetching repository details", &e);
            Err(e.into())
        }
    }
}
