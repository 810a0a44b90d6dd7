//! engine::push
//!
//! The push orchestrator: mirrors the latest commit of a source repository
//! onto the default branch of a target repository and records the attempt.
//!
//! # Steps
//!
//! 1. Insert a `started` operation log entry
//! 2. Load the source and target rows (`RepositoryNotFound` if either is
//!    missing, before any upstream call)
//! 3. Fetch source details
//! 4. Take the most recent commit (`NoCommits` if none)
//! 5. Ensure the commit exists in the target
//! 6. Point `refs/heads/<target default branch>` at it
//! 7. Mark the target row `synced` and the entry `completed`
//!
//! Any failure after step 1 marks the entry `failed` before the error is
//! returned.
//!
//! # Known gap
//!
//! Steps 6 and 7 are not atomic. A crash between them leaves the remote
//! reference moved while the entry stays `started` and the row keeps its
//! previous values.

use serde::Serialize;
use serde_json::json;

use super::audit::{AuditTrail, Traced, TracedError};
use super::details::fetch_repo_details;
use super::errors::PushError;
use super::ledger::Ledger;
use super::sync::{RefOutcome, RefUpdate, Synchronizer};
use super::EngineOptions;
use crate::core::records::{OperationLogEntry, RecordStore, Repository};
use crate::core::types::{PushType, RecordId, RefName, UtcTimestamp};
use crate::core::url::parse_github_url;
use crate::forge::GitHost;

/// A request to push `source` onto `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub source_repo_id: RecordId,
    pub target_repo_id: RecordId,
    pub push_type: PushType,
}

/// Result of a successful push.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    /// The completed log entry
    pub operation: OperationLogEntry,
    /// The target row after the push
    pub target: Repository,
    /// SHA of the source commit that was pushed
    pub commit_sha: String,
    /// Reference that now points at it
    pub ref_name: RefName,
    #[serde(skip)]
    pub ref_outcome: RefOutcome,
}

/// What steps 2-6 produced.
struct Pushed {
    target: Repository,
    commit_sha: String,
    ref_name: RefName,
    ref_outcome: RefOutcome,
}

/// Runs pushes against one record store and Git host.
pub struct PushOrchestrator<'a> {
    store: &'a dyn RecordStore,
    host: &'a dyn GitHost,
    options: EngineOptions,
}

impl<'a> PushOrchestrator<'a> {
    pub fn new(store: &'a dyn RecordStore, host: &'a dyn GitHost, options: EngineOptions) -> Self {
        Self {
            store,
            host,
            options,
        }
    }

    /// Run a push.
    ///
    /// The returned trail covers every step, on success and on failure.
    pub async fn push(
        &self,
        request: &PushRequest,
    ) -> Result<Traced<PushOutcome>, TracedError<PushError>> {
        let mut trail = AuditTrail::new();
        trail.info_with(
            "Received operation request",
            json!({
                "type": "push",
                "sourceRepoId": request.source_repo_id,
                "targetRepoId": request.target_repo_id,
                "pushType": request.push_type,
            }),
        );

        let ledger = Ledger::new(self.store);
        let mut entry = match ledger.begin(
            request.source_repo_id.clone(),
            request.target_repo_id.clone(),
            request.push_type,
        ) {
            Ok(entry) => entry,
            Err(e) => {
                trail.error("Error creating operation log", &e);
                return Err(TracedError::new(e.into(), trail));
            }
        };
        trail.info_with(
            "Starting Git push operation",
            json!({ "operationId": entry.id }),
        );

        let result = match self.run(request, &mut trail).await {
            Ok(pushed) => ledger
                .complete(&mut entry, &pushed.commit_sha)
                .map(|()| pushed)
                .map_err(PushError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(pushed) => {
                trail.success("Repository status updated in database");
                tracing::info!(
                    operation = %entry.id,
                    commit = %pushed.commit_sha,
                    "push completed"
                );
                Ok(Traced::new(
                    PushOutcome {
                        operation: entry,
                        target: pushed.target,
                        commit_sha: pushed.commit_sha,
                        ref_name: pushed.ref_name,
                        ref_outcome: pushed.ref_outcome,
                    },
                    trail,
                ))
            }
            Err(err) => {
                trail.error("Push operation failed", &err);
                if let Err(ledger_err) = ledger.fail(&mut entry, &err.to_string()) {
                    tracing::error!(
                        operation = %entry.id,
                        error = %ledger_err,
                        "could not mark operation failed"
                    );
                    trail.error("Error updating operation log", &ledger_err);
                }
                Err(TracedError::new(err, trail))
            }
        }
    }

    async fn run(
        &self,
        request: &PushRequest,
        trail: &mut AuditTrail,
    ) -> Result<Pushed, PushError> {
        let source = self.store.get_repository(&request.source_repo_id)?;
        let target = self.store.get_repository(&request.target_repo_id)?;
        let (source, mut target) = match (source, target) {
            (Some(s), Some(t)) => (s, t),
            (s, _) => {
                trail.error_with(
                    "Repository not found",
                    json!({
                        "sourceRepoId": request.source_repo_id,
                        "targetRepoId": request.target_repo_id,
                    }),
                );
                let missing = if s.is_none() {
                    &request.source_repo_id
                } else {
                    &request.target_repo_id
                };
                return Err(PushError::RepositoryNotFound(missing.clone()));
            }
        };
        trail.info_with(
            "Repositories found",
            json!({
                "source": { "url": source.url, "branch": source.default_branch },
                "target": { "url": target.url, "branch": target.default_branch },
            }),
        );

        let details = fetch_repo_details(
            self.host,
            &source.url,
            self.options.commit_history_depth,
            trail,
        )
        .await?;

        let Some(commit) = details.latest_commit().cloned() else {
            trail.error_with(
                "No commits found in source repository",
                json!({ "source": source.url }),
            );
            return Err(PushError::NoCommits);
        };
        trail.info_with(
            "Source commit details",
            json!({ "sha": commit.sha, "message": commit.message, "date": commit.date }),
        );

        let target_slug = parse_github_url(&target.url)?;
        let sync = Synchronizer::new(self.host);
        let target_sha = sync
            .ensure_commit(&details.slug, &target_slug, &commit.sha, trail)
            .await?;

        let branch = target.target_branch_or(&self.options.default_branch);
        let ref_name = RefName::for_branch(branch)
            .map_err(|e| PushError::InvalidRequest(e.to_string()))?;
        let mode = RefUpdate::for_push(request.push_type, target.lease().map(str::to_string));
        let ref_outcome = sync
            .ensure_ref(&target_slug, &ref_name, &target_sha, &mode, trail)
            .await?;
        trail.success_with(
            "Push operation completed",
            json!({ "targetRepo": target.url, "ref": ref_name.as_str(), "sha": target_sha }),
        );

        #[cfg(any(test, feature = "fault_injection"))]
        super::engine_hooks::run_after_ref_update();

        let commit_date = commit.date.as_deref().and_then(UtcTimestamp::parse);
        target.mark_synced(&commit.sha, &target_sha, commit_date);
        self.store.update_repository(&target)?;

        Ok(Pushed {
            target,
            commit_sha: commit.sha,
            ref_name,
            ref_outcome,
        })
    }
}
