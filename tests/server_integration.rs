//! Integration tests for the HTTP endpoint.
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is bound.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use repomirror::core::records::{MemoryStore, RecordStore, Repository};
use repomirror::core::types::{OperationStatus, RecordId, RepoStatus};
use repomirror::core::url::{parse_github_url, RepoSlug};
use repomirror::engine::EngineOptions;
use repomirror::forge::mock::MockForge;
use repomirror::server::{create_router, AppState};

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    forge: Arc<MockForge>,
}

fn tracked(id: &str, url: &str) -> Repository {
    let slug = parse_github_url(url).unwrap();
    Repository::with_id(RecordId::new(id).unwrap(), url, &slug)
}

fn app() -> TestApp {
    let alice = RepoSlug::new("alice", "demo");
    let bob = RepoSlug::new("bob", "demo");
    let forge = MockForge::new();
    forge.add_repo(&alice, "main");
    forge.add_repo(&bob, "main");
    forge.add_commit(&alice, "abc123", &[], "Initial commit");
    forge.set_ref(&alice, "refs/heads/main", "abc123");

    let store = Arc::new(MemoryStore::with_repositories([
        tracked("src", "https://github.com/alice/demo"),
        tracked("dst", "https://github.com/bob/demo"),
    ]));
    let forge = Arc::new(forge);
    let state = AppState::new(store.clone(), forge.clone(), EngineOptions::default());

    TestApp {
        router: create_router(state),
        store,
        forge,
    }
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn messages(body: &Value) -> Vec<&str> {
    body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["message"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Operations
// =============================================================================

#[tokio::test]
async fn push_returns_success_envelope() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json(
            "/",
            json!({ "type": "push", "sourceRepoId": "src", "targetRepoId": "dst", "pushType": "regular" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].is_string());
    assert!(body.get("data").is_none());
    let logs = messages(&body);
    assert_eq!(logs.first(), Some(&"Received operation request"));
    assert_eq!(logs.last(), Some(&"Repository status updated in database"));
    assert!(body["logs"][0]["timestamp"].is_string());
    assert_eq!(body["logs"][0]["type"], "info");

    let target = app
        .store
        .get_repository(&RecordId::new("dst").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(target.status, RepoStatus::Synced);
    assert_eq!(
        app.forge.ref_target(&RepoSlug::new("bob", "demo"), "refs/heads/main").as_deref(),
        Some("abc123")
    );
}

#[tokio::test]
async fn git_operations_path_defaults_to_regular_push() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json(
            "/git-operations",
            json!({ "type": "push", "sourceRepoId": "src", "targetRepoId": "dst" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let ops = app.store.list_operations().unwrap();
    assert_eq!(ops[0].push_type.as_str(), "regular");
    assert_eq!(ops[0].status, OperationStatus::Completed);
}

#[tokio::test]
async fn unknown_operation_type_is_bad_request() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json(
            "/",
            json!({ "type": "pull", "sourceRepoId": "src", "targetRepoId": "dst" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid operation type: pull");
    assert_eq!(messages(&body), vec!["Operation failed"]);
    assert!(app.store.list_operations().unwrap().is_empty());
    assert!(app.forge.operations().is_empty());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["kind"], "invalid_request");
}

#[tokio::test]
async fn invalid_push_type_is_bad_request() {
    let app = app();

    let (status, _) = send(
        app.router,
        post_json(
            "/",
            json!({ "type": "push", "sourceRepoId": "src", "targetRepoId": "dst", "pushType": "yolo" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_repository_is_server_error_with_trail() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json(
            "/",
            json!({ "type": "push", "sourceRepoId": "src", "targetRepoId": "nope" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Repository not found: nope");
    assert_eq!(body["details"]["kind"], "repository_not_found");
    let logs = messages(&body);
    assert!(logs.contains(&"Repository not found"));
    assert!(logs.contains(&"Push operation failed"));
    assert_eq!(logs.last(), Some(&"Operation failed"));

    let ops = app.store.list_operations().unwrap();
    assert_eq!(ops[0].status, OperationStatus::Failed);
}

// =============================================================================
// Analysis and registration
// =============================================================================

#[tokio::test]
async fn analyze_returns_details() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json("/analyze", json!({ "url": "https://github.com/alice/demo.git" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["owner"], "alice");
    assert_eq!(body["data"]["repo"], "demo");
    assert_eq!(body["data"]["defaultBranch"], "main");
    assert_eq!(body["data"]["lastCommits"][0]["sha"], "abc123");
    assert!(app.forge.operations().iter().all(|op| !op.is_write()));
}

#[tokio::test]
async fn analyze_rejects_non_github_url() {
    let app = app();

    let (status, body) = send(
        app.router,
        post_json("/analyze", json!({ "url": "https://example.com/alice/demo" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["kind"], "invalid_url");
    assert!(app.forge.operations().is_empty());
}

#[tokio::test]
async fn register_then_list() {
    let app = app();
    let carol = RepoSlug::new("carol", "tools");
    app.forge.add_repo(&carol, "develop");

    let (status, body) = send(
        app.router.clone(),
        post_json("/repositories", json!({ "url": "https://github.com/carol/tools" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "carol/tools");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["defaultBranch"], "develop");

    let (status, body) = send(app.router, get("/repositories")).await;
    assert_eq!(status, StatusCode::OK);
    let urls: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["url"].as_str().unwrap())
        .collect();
    assert!(urls.contains(&"https://github.com/carol/tools"));
    assert_eq!(urls.len(), 3);
}

// =============================================================================
// History, health, CORS
// =============================================================================

#[tokio::test]
async fn history_is_limited_and_newest_first() {
    let app = app();
    for target in ["dst", "nope", "dst"] {
        send(
            app.router.clone(),
            post_json(
                "/",
                json!({ "type": "push", "sourceRepoId": "src", "targetRepoId": target }),
            ),
        )
        .await;
    }

    let (status, body) = send(app.router, get("/operations?limit=2")).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let started = |i: usize| {
        chrono::DateTime::parse_from_rfc3339(entries[i]["startedAt"].as_str().unwrap()).unwrap()
    };
    assert!(started(0) >= started(1));
}

#[tokio::test]
async fn health_reports_host() {
    let app = app();

    let (status, body) = send(app.router, get("/healthz")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["host"], "mock");
}

#[tokio::test]
async fn preflight_allows_any_origin() {
    let app = app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/git-operations")
        .header(header::ORIGIN, "https://dashboard.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
