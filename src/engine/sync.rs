//! engine::sync
//!
//! Makes a commit exist in a target repository and points a reference at it.
//!
//! # Commits
//!
//! [`Synchronizer::ensure_commit`] checks the target first. When the commit
//! is missing it is rebuilt there from the source: the source tree is read
//! recursively and replayed as a flat list of blob and submodule entries
//! (sub-trees are implied by paths), then a commit with the same message,
//! parents and signatures is created on top. A truncated tree listing is an
//! error rather than a partial copy.
//!
//! # References
//!
//! [`Synchronizer::ensure_ref`] creates the reference when it does not
//! exist and otherwise moves it. A not-found lookup is the only swallowed
//! error. Moving a reference that already points at the commit is a no-op,
//! so repeated calls converge on the same state.

use serde_json::json;

use super::audit::AuditTrail;
use super::errors::PushError;
use crate::core::types::{PushType, RefName};
use crate::core::url::RepoSlug;
use crate::forge::{ForgeError, GitHost, GitRef, NewCommit, TreeEntryKind};

/// How an existing reference may be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefUpdate {
    /// Only fast-forward moves.
    FastForward,
    /// Any move.
    Force,
    /// Any move, provided the reference still points at `expected`.
    ///
    /// `None` means nothing was observed, and the move is forced.
    ForceWithLease { expected: Option<String> },
}

impl RefUpdate {
    /// Build the update mode for a push type.
    ///
    /// `lease` is the last SHA recorded for the target; only
    /// `force-with-lease` uses it.
    pub fn for_push(push_type: PushType, lease: Option<String>) -> Self {
        match push_type {
            PushType::Regular => RefUpdate::FastForward,
            PushType::Force => RefUpdate::Force,
            PushType::ForceWithLease => RefUpdate::ForceWithLease { expected: lease },
        }
    }

    fn is_force(&self) -> bool {
        !matches!(self, RefUpdate::FastForward)
    }
}

/// What [`Synchronizer::ensure_ref`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefOutcome {
    Created,
    Updated { previous: String },
    Unchanged,
}

/// Commit and reference synchronization against one Git host.
pub struct Synchronizer<'a> {
    host: &'a dyn GitHost,
}

impl<'a> Synchronizer<'a> {
    pub fn new(host: &'a dyn GitHost) -> Self {
        Self { host }
    }

    /// Make commit `sha` from `source` exist in `target`.
    ///
    /// Returns the SHA the target has for the commit.
    pub async fn ensure_commit(
        &self,
        source: &RepoSlug,
        target: &RepoSlug,
        sha: &str,
        trail: &mut AuditTrail,
    ) -> Result<String, PushError> {
        trail.info_with(
            "Checking for commit in target repository",
            json!({ "target": target.to_string(), "sha": sha }),
        );
        match self.host.commit_exists(target, sha).await {
            Ok(true) => {
                trail.success_with(
                    "Commit already present in target repository",
                    json!({ "sha": sha }),
                );
                return Ok(sha.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                trail.error("Error copying commit", &e);
                return Err(e.into());
            }
        }

        match self.copy_commit(source, target, sha, trail).await {
            Ok(new_sha) => Ok(new_sha),
            Err(e) => {
                trail.error("Error copying commit", &e);
                Err(e)
            }
        }
    }

    async fn copy_commit(
        &self,
        source: &RepoSlug,
        target: &RepoSlug,
        sha: &str,
        trail: &mut AuditTrail,
    ) -> Result<String, PushError> {
        trail.info_with(
            "Fetching commit from source repository",
            json!({ "sha": sha }),
        );
        let commit = self.host.get_commit(source, sha).await?;

        trail.info("Fetching tree from source repository");
        let tree = self.host.get_tree(source, &commit.tree_sha, true).await?;
        if tree.truncated {
            return Err(ForgeError::ApiError {
                status: 200,
                message: format!("Tree {} is too large to copy (listing truncated)", tree.sha),
            }
            .into());
        }
        let entries: Vec<_> = tree
            .entries
            .into_iter()
            .filter(|e| e.kind != TreeEntryKind::Tree)
            .collect();

        trail.info_with(
            "Creating tree in target repository",
            json!({ "entries": entries.len() }),
        );
        let tree_sha = self.host.create_tree(target, &entries).await?;

        trail.info("Creating commit in target repository");
        let created = self
            .host
            .create_commit(
                target,
                &NewCommit {
                    message: commit.message,
                    tree_sha,
                    parent_shas: commit.parent_shas,
                    author: commit.author,
                    committer: commit.committer,
                },
            )
            .await?;

        trail.success_with(
            "Commit copied successfully",
            json!({ "sourceSha": sha, "targetSha": created.sha }),
        );
        Ok(created.sha)
    }

    /// Point `name` in `repo` at `sha`, creating it if needed.
    pub async fn ensure_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
        mode: &RefUpdate,
        trail: &mut AuditTrail,
    ) -> Result<RefOutcome, PushError> {
        trail.info_with(
            "Ensuring reference exists",
            json!({
                "owner": repo.owner,
                "repo": repo.repo,
                "ref": name.as_str(),
                "sha": sha,
                "force": mode.is_force(),
            }),
        );

        let result = self.apply_ref(repo, name, sha, mode, trail).await;
        if let Err(e) = &result {
            trail.error("Error ensuring reference", e);
        }
        result
    }

    async fn apply_ref(
        &self,
        repo: &RepoSlug,
        name: &RefName,
        sha: &str,
        mode: &RefUpdate,
        trail: &mut AuditTrail,
    ) -> Result<RefOutcome, PushError> {
        let existing: Option<GitRef> = match self.host.get_ref(repo, name).await {
            Ok(r) => {
                trail.info_with(
                    "Reference exists",
                    json!({ "ref": name.as_str(), "currentSha": r.sha }),
                );
                Some(r)
            }
            Err(e) if e.is_not_found() => {
                trail.info_with(
                    "Reference does not exist, will create it",
                    json!({ "ref": name.as_str() }),
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        let Some(current) = existing else {
            trail.info_with(
                "Creating new reference",
                json!({ "ref": name.as_str(), "sha": sha }),
            );
            let created = self.host.create_ref(repo, name, sha).await?;
            trail.success_with(
                "Reference created successfully",
                json!({ "ref": created.name.as_str() }),
            );
            return Ok(RefOutcome::Created);
        };

        if current.sha == sha {
            trail.success_with(
                "Reference already up to date",
                json!({ "ref": name.as_str(), "sha": sha }),
            );
            return Ok(RefOutcome::Unchanged);
        }

        if let RefUpdate::ForceWithLease {
            expected: Some(expected),
        } = mode
        {
            if *expected != current.sha {
                return Err(PushError::LeaseMismatch {
                    ref_name: name.to_string(),
                    expected: expected.clone(),
                    actual: current.sha,
                });
            }
        }

        trail.info_with(
            "Updating existing reference",
            json!({ "ref": name.as_str(), "sha": sha, "force": mode.is_force() }),
        );
        let updated = self
            .host
            .update_ref(repo, name, sha, mode.is_force())
            .await?;
        trail.success_with(
            "Reference updated successfully",
            json!({ "ref": updated.name.as_str() }),
        );
        Ok(RefOutcome::Updated {
            previous: current.sha,
        })
    }
}
