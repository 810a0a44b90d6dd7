//! Integration tests for the GitHub client against a local mock server.
//!
//! Each test mounts the endpoints it expects and checks both the request
//! shape (path, headers, body) and the mapping of the response.
//! Live GitHub API tests are behind the `live_github_tests` feature flag.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use repomirror::core::records::{MemoryStore, RecordStore, Repository};
use repomirror::core::types::{OperationStatus, PushType, RecordId, RefName, RepoStatus};
use repomirror::core::url::{parse_github_url, RepoSlug};
use repomirror::engine::{EngineOptions, PushOrchestrator, PushRequest, RefOutcome};
use repomirror::forge::github::GitHubForge;
use repomirror::forge::{ForgeError, GitHost};

const TOKEN: &str = "ghp_test_token_value";

fn alice() -> RepoSlug {
    RepoSlug::new("alice", "demo")
}

fn bob() -> RepoSlug {
    RepoSlug::new("bob", "demo")
}

fn main_ref() -> RefName {
    RefName::for_branch("main").unwrap()
}

async fn setup() -> (MockServer, GitHubForge) {
    let server = MockServer::start().await;
    let forge = GitHubForge::with_api_base(TOKEN, server.uri());
    (server, forge)
}

fn git_ref(name: &str, sha: &str) -> serde_json::Value {
    json!({ "ref": name, "object": { "sha": sha, "type": "commit" } })
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn get_repository_sends_auth_headers() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(header("accept", "application/vnd.github+json"))
        .and(header("x-github-api-version", "2022-11-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "alice/demo",
            "default_branch": "trunk",
            "private": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = forge.get_repository(&alice()).await.unwrap();

    assert_eq!(info.full_name, "alice/demo");
    assert_eq!(info.default_branch, "trunk");
}

#[tokio::test]
async fn list_commits_passes_page_size() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/commits"))
        .and(query_param("per_page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "sha": "abc123",
                "commit": {
                    "message": "Initial commit",
                    "author": { "name": "Alice", "email": "a@example.com", "date": "2024-05-01T10:00:00Z" }
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let commits = forge.list_commits(&alice(), 5).await.unwrap();

    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].sha, "abc123");
    assert_eq!(commits[0].message, "Initial commit");
    assert_eq!(commits[0].date.as_deref(), Some("2024-05-01T10:00:00Z"));
}

#[tokio::test]
async fn empty_repository_lists_no_commits() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/commits"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Git Repository is empty." })),
        )
        .mount(&server)
        .await;

    assert!(forge.list_commits(&alice(), 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_branches_maps_protection() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main", "protected": true, "commit": { "sha": "abc123", "url": "x" } },
            { "name": "dev", "commit": { "sha": "def456", "url": "y" } }
        ])))
        .mount(&server)
        .await;

    let branches = forge.list_branches(&alice()).await.unwrap();

    assert_eq!(branches.len(), 2);
    assert!(branches[0].protected);
    assert!(!branches[1].protected);
    assert_eq!(branches[1].sha, "def456");
}

#[tokio::test]
async fn missing_commit_is_reported_absent() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/bob/demo/git/commits/abc123"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    assert!(!forge.commit_exists(&bob(), "abc123").await.unwrap());
}

#[tokio::test]
async fn get_ref_uses_single_ref_endpoint() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .and(path("/repos/bob/demo/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(git_ref("refs/heads/main", "zzz999")))
        .expect(1)
        .mount(&server)
        .await;

    let r = forge.get_ref(&bob(), &main_ref()).await.unwrap();

    assert_eq!(r.name.as_str(), "refs/heads/main");
    assert_eq!(r.sha, "zzz999");
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn create_ref_posts_full_name() {
    let (server, forge) = setup().await;
    Mock::given(method("POST"))
        .and(path("/repos/bob/demo/git/refs"))
        .and(body_json(json!({ "ref": "refs/heads/main", "sha": "abc123" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(git_ref("refs/heads/main", "abc123")))
        .expect(1)
        .mount(&server)
        .await;

    let r = forge.create_ref(&bob(), &main_ref(), "abc123").await.unwrap();
    assert_eq!(r.sha, "abc123");
}

#[tokio::test]
async fn update_ref_sends_force_flag() {
    let (server, forge) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/bob/demo/git/refs/heads/main"))
        .and(body_json(json!({ "sha": "abc123", "force": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(git_ref("refs/heads/main", "abc123")))
        .expect(1)
        .mount(&server)
        .await;

    forge
        .update_ref(&bob(), &main_ref(), "abc123", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn non_fast_forward_is_api_error() {
    let (server, forge) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/bob/demo/git/refs/heads/main"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "message": "Update is not a fast forward" })),
        )
        .mount(&server)
        .await;

    let err = forge
        .update_ref(&bob(), &main_ref(), "abc123", false)
        .await
        .unwrap_err();

    match err {
        ForgeError::ApiError { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Update is not a fast forward");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

// =============================================================================
// Error mapping
// =============================================================================

#[tokio::test]
async fn unauthorized_is_auth_failed() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&server)
        .await;

    let err = forge.get_repository(&alice()).await.unwrap_err();
    assert!(matches!(err, ForgeError::AuthFailed(_)));
}

#[tokio::test]
async fn forbidden_rate_limit_is_rate_limited() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "message": "API rate limit exceeded for 1.2.3.4." })),
        )
        .mount(&server)
        .await;

    let err = forge.get_repository(&alice()).await.unwrap_err();
    assert!(matches!(err, ForgeError::RateLimited));
}

#[tokio::test]
async fn forbidden_reports_required_permissions() {
    let (server, forge) = setup().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("X-Accepted-GitHub-Permissions", "contents=write")
                .set_body_json(json!({ "message": "Resource not accessible by integration" })),
        )
        .mount(&server)
        .await;

    let err = forge
        .create_ref(&bob(), &main_ref(), "abc123")
        .await
        .unwrap_err();

    match err {
        ForgeError::AuthFailed(message) => {
            assert!(message.contains("Resource not accessible"));
            assert!(message.contains("contents=write"));
        }
        other => panic!("expected AuthFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_keeps_status() {
    let (server, forge) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = forge.get_repository(&alice()).await.unwrap_err();
    assert!(matches!(err, ForgeError::ApiError { status: 502, .. }));
}

#[tokio::test]
async fn missing_token_fails_without_request() {
    let server = MockServer::start().await;
    let forge = GitHubForge::with_api_base("", server.uri());

    let err = forge.get_repository(&alice()).await.unwrap_err();

    assert!(matches!(err, ForgeError::AuthRequired));
    assert_eq!(err.to_string(), "GitHub token not configured");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn push_copies_commit_and_creates_ref() {
    let (server, forge) = setup().await;

    // Source reads
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "full_name": "alice/demo", "default_branch": "main"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "main", "protected": false, "commit": { "sha": "abc123" } }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/commits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "sha": "abc123",
                "commit": {
                    "message": "Initial commit",
                    "author": { "name": "Alice", "date": "2024-05-01T10:00:00Z" }
                }
            }
        ])))
        .mount(&server)
        .await;
    let signature = json!({ "name": "Alice", "email": "a@example.com", "date": "2024-05-01T10:00:00Z" });
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/git/commits/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc123",
            "message": "Initial commit",
            "author": signature,
            "committer": signature,
            "tree": { "sha": "tree1" },
            "parents": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/alice/demo/git/trees/tree1"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "tree1",
            "truncated": false,
            "tree": [
                { "path": "src", "mode": "040000", "type": "tree", "sha": "subtree" },
                { "path": "src/lib.rs", "mode": "100644", "type": "blob", "sha": "blob1" }
            ]
        })))
        .mount(&server)
        .await;

    // Target writes
    Mock::given(method("GET"))
        .and(path("/repos/bob/demo/git/commits/abc123"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/bob/demo/git/trees"))
        .and(body_json(json!({
            "tree": [{ "path": "src/lib.rs", "mode": "100644", "type": "blob", "sha": "blob1" }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": "tree1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/bob/demo/git/commits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sha": "abc123",
            "message": "Initial commit",
            "author": signature,
            "committer": signature,
            "tree": { "sha": "tree1" },
            "parents": []
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/bob/demo/git/ref/heads/main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/bob/demo/git/refs"))
        .and(body_json(json!({ "ref": "refs/heads/main", "sha": "abc123" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(git_ref("refs/heads/main", "abc123")))
        .expect(1)
        .mount(&server)
        .await;

    let src = parse_github_url("https://github.com/alice/demo").unwrap();
    let dst = parse_github_url("https://github.com/bob/demo").unwrap();
    let store = MemoryStore::with_repositories([
        Repository::with_id(RecordId::new("src").unwrap(), "https://github.com/alice/demo", &src),
        Repository::with_id(RecordId::new("dst").unwrap(), "https://github.com/bob/demo", &dst),
    ]);

    let orchestrator = PushOrchestrator::new(&store, &forge, EngineOptions::default());
    let traced = orchestrator
        .push(&PushRequest {
            source_repo_id: RecordId::new("src").unwrap(),
            target_repo_id: RecordId::new("dst").unwrap(),
            push_type: PushType::Regular,
        })
        .await
        .unwrap();

    assert_eq!(traced.value.ref_outcome, RefOutcome::Created);
    assert_eq!(traced.value.commit_sha, "abc123");
    let target = store
        .get_repository(&RecordId::new("dst").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(target.status, RepoStatus::Synced);
    assert_eq!(
        store.list_operations().unwrap()[0].status,
        OperationStatus::Completed
    );
}

// =============================================================================
// Live API (read-only)
// =============================================================================

#[cfg(feature = "live_github_tests")]
mod live_tests {
    use super::*;

    fn get_test_token() -> Option<String> {
        std::env::var("GITHUB_ACCESS_TOKEN").ok()
    }

    fn get_test_repo() -> Option<RepoSlug> {
        let url = std::env::var("REPOMIRROR_TEST_REPO").ok()?;
        parse_github_url(&url).ok()
    }

    #[tokio::test]
    async fn live_details_of_test_repo() {
        let Some(token) = get_test_token() else {
            eprintln!("Skipping: GITHUB_ACCESS_TOKEN not set");
            return;
        };
        let Some(repo) = get_test_repo() else {
            eprintln!("Skipping: REPOMIRROR_TEST_REPO not set");
            return;
        };

        let forge = GitHubForge::new(token);
        let info = forge.get_repository(&repo).await.unwrap();
        assert!(!info.default_branch.is_empty());

        let commits = forge.list_commits(&repo, 1).await.unwrap();
        assert!(commits.len() <= 1);
    }

    #[tokio::test]
    async fn live_missing_ref_is_not_found() {
        let Some(token) = get_test_token() else {
            eprintln!("Skipping: GITHUB_ACCESS_TOKEN not set");
            return;
        };
        let Some(repo) = get_test_repo() else {
            eprintln!("Skipping: REPOMIRROR_TEST_REPO not set");
            return;
        };

        let forge = GitHubForge::new(token);
        let name = RefName::for_branch("repomirror-does-not-exist-7f3a").unwrap();
        let err = forge.get_ref(&repo, &name).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
