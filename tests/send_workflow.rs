//! End-to-end delivery tests: courier, SQLite history and a mock GitHub.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use repo_courier_lib::db::{self, deliveries, pool::DbPool};
use repo_courier_lib::models::{AppConfig, DeliveryStatus, LetterRequest};
use repo_courier_lib::services::courier::Courier;
use repo_courier_lib::services::github_client::WriteOperation;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn commit_body(commit_sha: &str) -> serde_json::Value {
    json!({
        "content": { "path": "x", "sha": "blob" },
        "commit": { "sha": commit_sha, "html_url": null },
    })
}

async fn setup(server: &MockServer, destinations: &str) -> (TempDir, DbPool, Courier) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db"))
        .await
        .unwrap_or_else(|e| panic!("db: {e}"));

    let config = AppConfig {
        repo: "octo/notes".into(),
        branch_folder: destinations.into(),
        api_url: server.uri(),
        recipient: "Sam".into(),
        sender: "Alex".into(),
        ..Default::default()
    };
    let courier = Courier::from_config(&config, "ghp_test", pool.clone())
        .unwrap_or_else(|e| panic!("courier: {e}"));

    (dir, pool, courier)
}

#[tokio::test]
async fn test_letters_reach_every_destination() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/notes/contents/(love|letters)/letter-\d{14}(-\d+)?\.txt$"))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("letter-commit")))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/repos/octo/notes/contents/(love|letters)/delivery_log\.txt$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/notes/contents/(love|letters)/delivery_log\.txt$"))
        .and(body_partial_json(json!({"message": "Start delivery log"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("log-commit")))
        .expect(4)
        .mount(&server)
        .await;

    let (_dir, pool, courier) = setup(&server, "main/love, gh-pages").await;

    let request = LetterRequest::new("See you tonight", "romantic", "💖");
    let report = courier
        .send_letters(&request, 2)
        .await
        .unwrap_or_else(|e| panic!("send: {e}"));

    assert!(report.is_success(), "failures: {:?}", report.failed);
    assert_eq!(report.delivered.len(), 4);
    assert!(report.delivered.iter().all(|d| d.log_error.is_none()));
    assert!(report
        .delivered
        .iter()
        .any(|d| d.branch == "gh-pages" && d.path.starts_with("letters/")));

    let history = deliveries::recent_deliveries(&pool, 10).await.unwrap();
    assert_eq!(history.len(), 4);
    assert!(history
        .iter()
        .all(|r| r.status_enum() == DeliveryStatus::Success && r.theme.as_deref() == Some("romantic")));

    // The committed letter carries the composed text
    let requests = server.received_requests().await.unwrap_or_default();
    let letter_put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path().contains("/love/letter-"))
        .unwrap_or_else(|| panic!("no letter PUT"));
    let body: serde_json::Value = serde_json::from_slice(&letter_put.body).unwrap();
    let content = STANDARD
        .decode(body["content"].as_str().unwrap_or_default())
        .unwrap();
    let text = String::from_utf8(content).unwrap();
    assert!(text.starts_with("\nTo Sam, "));
    assert!(text.contains("See you tonight 💖"));
    assert!(text.ends_with("Alex\n"));
}

#[tokio::test]
async fn test_failed_destination_does_not_stop_others() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/notes/contents/love/letter-\d{14}\.txt$"))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("ok")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/notes/contents/letters/letter-\d{14}\.txt$"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Branch not found"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/contents/love/delivery_log.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/octo/notes/contents/love/delivery_log.txt"))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("log")))
        .mount(&server)
        .await;

    let (_dir, pool, courier) = setup(&server, "main/love,missing-branch").await;

    let report = courier
        .send_letters(&LetterRequest::new("", "poetic", ""), 1)
        .await
        .unwrap_or_else(|e| panic!("send: {e}"));

    assert!(!report.is_success());
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].branch, "main");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].branch, "missing-branch");
    assert!(report.failed[0].error.contains("Branch not found"));

    let (success, failed, skipped) = deliveries::delivery_counts(&pool).await.unwrap();
    assert_eq!((success, failed, skipped), (1, 1, 0));
}

#[tokio::test]
async fn test_log_failure_is_reported_but_letter_counts() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/octo/notes/contents/letters/letter-\d{14}\.txt$"))
        .respond_with(ResponseTemplate::new(201).set_body_json(commit_body("ok")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/contents/letters/delivery_log.txt"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (_dir, _pool, courier) = setup(&server, "main").await;

    let report = courier
        .send_letters(&LetterRequest::new("hi", "playful", ""), 1)
        .await
        .unwrap_or_else(|e| panic!("send: {e}"));

    assert!(report.is_success());
    assert!(report.delivered[0].log_error.is_some());
}

#[tokio::test]
async fn test_unknown_theme_fails_before_network() {
    let server = MockServer::start().await;
    let (_dir, _pool, courier) = setup(&server, "main").await;

    let err = courier
        .send_letters(&LetterRequest::new("hi", "gothic", ""), 1)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    let err = courier
        .send_letters(&LetterRequest::new("hi", "romantic", ""), 11)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("between 1 and 10"));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_upload_skips_identical_remote_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/notes/contents/letters/photo.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "photo.txt",
            "path": "letters/photo.txt",
            "sha": "sha-1",
            "size": 5,
            "type": "file",
            "encoding": "base64",
            "content": STANDARD.encode("hello"),
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    let (dir, pool, courier) = setup(&server, "main").await;
    let local = dir.path().join("photo.txt");
    std::fs::write(&local, "hello").unwrap();

    let report = courier
        .upload_file(&local)
        .await
        .unwrap_or_else(|e| panic!("upload: {e}"));

    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].operation, WriteOperation::Unchanged);

    let history = deliveries::recent_deliveries(&pool, 1).await.unwrap();
    assert_eq!(history[0].status_enum(), DeliveryStatus::Skipped);
    assert_eq!(history[0].kind, "upload");
}

#[tokio::test]
async fn test_upload_missing_file_is_rejected() {
    let server = MockServer::start().await;
    let (dir, _pool, courier) = setup(&server, "main").await;

    let err = courier
        .upload_file(&dir.path().join("nope.bin"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("File not found"));
}
