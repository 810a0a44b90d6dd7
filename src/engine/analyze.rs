//! engine::analyze
//!
//! Repository analysis and registration, the two operations the dashboard
//! runs before a push is possible.

use serde_json::json;

use super::audit::{AuditTrail, Traced, TracedError};
use super::details::{fetch_repo_details, RepoDetails};
use super::errors::PushError;
use crate::core::records::{RecordStore, Repository};
use crate::core::types::UtcTimestamp;
use crate::forge::GitHost;

/// Analyzes repositories on one Git host.
pub struct Analyzer<'a> {
    host: &'a dyn GitHost,
    depth: u8,
}

impl<'a> Analyzer<'a> {
    /// `depth` is the number of recent commits each analysis lists.
    pub fn new(host: &'a dyn GitHost, depth: u8) -> Self {
        Self { host, depth }
    }

    /// Fetch details for the repository at `url`.
    pub async fn analyze(&self, url: &str) -> Result<Traced<RepoDetails>, TracedError<PushError>> {
        let mut trail = AuditTrail::new();
        match fetch_repo_details(self.host, url, self.depth, &mut trail).await {
            Ok(details) => Ok(Traced::new(details, trail)),
            Err(e) => Err(TracedError::new(e, trail)),
        }
    }

    /// Analyze `url` and track it as a `pending` repository.
    ///
    /// Registering a URL that is already tracked returns the existing row
    /// without another upstream call.
    pub async fn register(
        &self,
        store: &dyn RecordStore,
        url: &str,
    ) -> Result<Traced<Repository>, TracedError<PushError>> {
        let url = url.trim();
        let existing = match store.list_repositories() {
            Ok(repos) => repos.into_iter().find(|r| r.url == url),
            Err(e) => {
                let mut trail = AuditTrail::new();
                trail.error("Error reading repositories", &e);
                return Err(TracedError::new(e.into(), trail));
            }
        };
        if let Some(repo) = existing {
            let mut trail = AuditTrail::new();
            trail.info_with(
                "Repository already registered",
                json!({ "id": repo.id, "url": repo.url }),
            );
            return Ok(Traced::new(repo, trail));
        }

        let Traced { value: details, mut trail } = self.analyze(url).await?;

        let mut repo = Repository::register(url, &details.slug);
        repo.default_branch = Some(details.default_branch.clone());
        if let Some(commit) = details.latest_commit() {
            repo.last_commit_sha = Some(commit.sha.clone());
            repo.last_commit_date = commit.date.as_deref().and_then(UtcTimestamp::parse);
        }

        if let Err(e) = store.insert_repository(&repo) {
            trail.error("Error saving repository", &e);
            return Err(TracedError::new(e.into(), trail));
        }
        trail.success_with(
            "Repository registered",
            json!({ "id": repo.id, "name": repo.name }),
        );
        Ok(Traced::new(repo, trail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::records::MemoryStore;
    use crate::core::types::RepoStatus;
    use crate::core::url::RepoSlug;
    use crate::forge::mock::MockForge;

    fn forge() -> MockForge {
        let slug = RepoSlug::new("alice", "demo");
        let forge = MockForge::new();
        forge.add_repo(&slug, "develop");
        forge.add_commit(&slug, "abc123", &[], "init");
        forge.set_ref(&slug, "refs/heads/develop", "abc123");
        forge
    }

    #[tokio::test]
    async fn analyze_returns_details_and_trail() {
        let forge = forge();
        let traced = Analyzer::new(&forge, 5)
            .analyze("https://github.com/alice/demo")
            .await
            .unwrap();
        assert_eq!(traced.value.default_branch, "develop");
        assert!(!traced.trail.is_empty());
    }

    #[tokio::test]
    async fn register_records_branch_and_latest_commit() {
        let forge = forge();
        let store = MemoryStore::new();

        let repo = Analyzer::new(&forge, 5)
            .register(&store, "https://github.com/alice/demo")
            .await
            .unwrap()
            .value;

        assert_eq!(repo.name, "alice/demo");
        assert_eq!(repo.default_branch.as_deref(), Some("develop"));
        assert_eq!(repo.last_commit_sha.as_deref(), Some("abc123"));
        assert_eq!(repo.status, RepoStatus::Pending);
        assert_eq!(store.get_repository(&repo.id).unwrap(), Some(repo));
    }

    #[tokio::test]
    async fn register_twice_returns_existing_row() {
        let forge = forge();
        let store = MemoryStore::new();
        let analyzer = Analyzer::new(&forge, 5);

        let first = analyzer
            .register(&store, "https://github.com/alice/demo")
            .await
            .unwrap();
        forge.clear_operations();
        let second = analyzer
            .register(&store, "https://github.com/alice/demo")
            .await
            .unwrap();

        assert_eq!(first.value.id, second.value.id);
        assert!(forge.operations().is_empty());
        assert_eq!(store.list_repositories().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_unknown_repository_fails_without_insert() {
        let forge = MockForge::new();
        let store = MemoryStore::new();

        let err = Analyzer::new(&forge, 5)
            .register(&store, "https://github.com/ghost/none")
            .await
            .unwrap_err();

        assert!(matches!(err.error, PushError::UpstreamApi(_)));
        assert!(store.list_repositories().unwrap().is_empty());
    }
}
