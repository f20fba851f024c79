//! Contract tests for the GitHub contents client against a mock server.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use repo_courier_lib::models::RepoId;
use repo_courier_lib::services::github_client::{GitHubClient, GitHubClientConfig, WriteOperation};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_PATH: &str = "/repos/octo/notes/contents/letters/note.txt";

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(GitHubClientConfig {
        base_url: server.uri(),
        token: "ghp_test".into(),
        timeout_secs: 5,
    })
    .unwrap_or_else(|e| panic!("client: {e}"))
}

fn repo() -> RepoId {
    RepoId::parse("octo/notes").unwrap()
}

fn file_body(content: &str, sha: &str) -> serde_json::Value {
    json!({
        "name": "note.txt",
        "path": "letters/note.txt",
        "sha": sha,
        "size": content.len(),
        "type": "file",
        "encoding": "base64",
        "content": STANDARD.encode(content),
    })
}

fn commit_body(commit_sha: &str) -> serde_json::Value {
    json!({
        "content": { "path": "letters/note.txt", "sha": "blob" },
        "commit": { "sha": commit_sha, "html_url": null },
    })
}

#[tokio::test]
async fn test_create_when_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(header("authorization", "Bearer ghp_test"))
        .and(body_partial_json(json!({
            "message": "create",
            "branch": "main",
            "content": STANDARD.encode("hello"),
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("c1")))
        .expect(1)
        .mount(&server)
        .await;

    let write = client(&server)
        .create_or_update_file(&repo(), "letters/note.txt", "create", "update", b"hello", "main")
        .await
        .unwrap_or_else(|e| panic!("write: {e}"));

    assert_eq!(write.operation, WriteOperation::Created);
    assert_eq!(write.commit_sha.as_deref(), Some("c1"));

    let requests = server.received_requests().await.unwrap_or_default();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap_or_else(|| panic!("no PUT recorded"));
    let body: serde_json::Value = serde_json::from_slice(&put.body).unwrap();
    assert!(body.get("sha").is_none(), "create must not send a sha: {body}");
}

#[tokio::test]
async fn test_update_sends_existing_sha() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body("old", "sha-old")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "message": "update",
            "sha": "sha-old",
            "content": STANDARD.encode("new"),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("c2")))
        .expect(1)
        .mount(&server)
        .await;

    let write = client(&server)
        .create_or_update_file(&repo(), "letters/note.txt", "create", "update", b"new", "main")
        .await
        .unwrap_or_else(|e| panic!("write: {e}"));

    assert_eq!(write.operation, WriteOperation::Updated);
    assert_eq!(write.commit_sha.as_deref(), Some("c2"));
}

#[tokio::test]
async fn test_identical_content_is_not_committed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body("same", "sha-1")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    let write = client(&server)
        .create_or_update_file(&repo(), "letters/note.txt", "create", "update", b"same", "main")
        .await
        .unwrap_or_else(|e| panic!("write: {e}"));

    assert_eq!(write.operation, WriteOperation::Unchanged);
    assert!(write.commit_sha.is_none());
}

#[tokio::test]
async fn test_append_extends_existing_log() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body("line one\n", "sha-log")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "sha": "sha-log",
            "content": STANDARD.encode("line one\nline two\n"),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("c3")))
        .expect(1)
        .mount(&server)
        .await;

    let write = client(&server)
        .append_to_file(&repo(), "letters/note.txt", "line two\n", "start", "append", "main")
        .await
        .unwrap_or_else(|e| panic!("append: {e}"));

    assert_eq!(write.operation, WriteOperation::Updated);
}

#[tokio::test]
async fn test_append_creates_missing_log() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "message": "start",
            "content": STANDARD.encode("first\n"),
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("c4")))
        .expect(1)
        .mount(&server)
        .await;

    let write = client(&server)
        .append_to_file(&repo(), "letters/note.txt", "first\n", "start", "append", "main")
        .await
        .unwrap_or_else(|e| panic!("append: {e}"));

    assert_eq!(write.operation, WriteOperation::Created);
}

#[tokio::test]
async fn test_directory_path_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([file_body("x", "s")])))
        .mount(&server)
        .await;

    let result = client(&server).get_file(&repo(), "letters/note.txt", "main").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_error_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.validate_token().await.unwrap_err();
    assert!(err.is_authentication_expired(), "got {err:?}");

    let err = client.get_repository(&repo()).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_rejected_write_surfaces_github_message() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Invalid request."})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .create_file(&repo(), "letters/note.txt", "create", b"x", "main")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid request."), "got {err}");
}

fn large_file_body() -> serde_json::Value {
    json!({
        "name": "note.txt",
        "path": "letters/note.txt",
        "sha": "big",
        "size": 2_000_000,
        "type": "file",
        "encoding": "none",
        "content": "",
    })
}

#[tokio::test]
async fn test_append_to_large_file_reads_blob() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(large_file_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/git/blobs/big"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "big",
            "size": 9,
            "encoding": "base64",
            "content": STANDARD.encode("old line\n"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "sha": "big",
            "content": STANDARD.encode("old line\nnew line\n"),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("c5")))
        .expect(1)
        .mount(&server)
        .await;

    let write = client(&server)
        .append_to_file(&repo(), "letters/note.txt", "new line\n", "start", "append", "main")
        .await
        .unwrap_or_else(|e| panic!("append: {e}"));

    assert_eq!(write.operation, WriteOperation::Updated);
}

#[tokio::test]
async fn test_append_to_unreadable_large_file_never_overwrites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(large_file_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/git/blobs/big"))
        .respond_with(ResponseTemplate::new(500).set_body_string("blob unavailable"))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    let result = client(&server)
        .append_to_file(&repo(), "letters/note.txt", "new line\n", "start", "append", "main")
        .await;

    assert!(result.is_err());
}

async fn user_error(status: u16, body: ResponseTemplate) -> String {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(body)
        .mount(&server)
        .await;

    let err = client(&server).validate_token().await.unwrap_err();
    let message = err.to_string();
    assert!(
        matches!(err, repo_courier_lib::error::AppError::GitHubApi { status_code: Some(code), .. } if code == status),
        "got {err:?}"
    );
    message
}

#[tokio::test]
async fn test_forbidden_maps_to_access_denied() {
    let message = user_error(
        403,
        ResponseTemplate::new(403).set_body_json(json!({"message": "Resource not accessible by integration"})),
    )
    .await;
    assert!(message.contains("Access denied"), "got {message}");
}

#[tokio::test]
async fn test_rate_limit_detection() {
    let message = user_error(429, ResponseTemplate::new(429)).await;
    assert!(message.contains("Rate limit exceeded"), "got {message}");

    let message = user_error(
        403,
        ResponseTemplate::new(403)
            .set_body_json(json!({"message": "API rate limit exceeded for user ID 1."})),
    )
    .await;
    assert!(message.contains("Rate limit exceeded"), "got {message}");
}

#[tokio::test]
async fn test_unparsed_error_body_is_reported_with_status() {
    let message = user_error(
        500,
        ResponseTemplate::new(500).set_body_string("upstream exploded"),
    )
    .await;
    assert!(message.contains("Request failed (500): upstream exploded"), "got {message}");
}
