//! Router-level integration tests with a mocked provider backend.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recall_server::config::ServerConfig;
use recall_server::{AppCore, build_router};

fn test_core(openai_base_url: String, temp_dir: &TempDir) -> (Router, Arc<AppCore>) {
    let db_path = temp_dir.path().join("test.db");
    let config = ServerConfig {
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: Some(openai_base_url),
        ..ServerConfig::default()
    };
    let core = Arc::new(AppCore::new(config, db_path.to_str().unwrap()).unwrap());
    (build_router(core.clone()), core)
}

async fn mock_provider() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello from the mock"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })))
        .mount(&server)
        .await;
    server
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_chat_with_fresh_user_creates_rows_without_injection() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "alice", "message": "Hello there"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "alice");
    assert_eq!(body["message"], "Hello from the mock");
    assert_eq!(body["tokens_used"], 20);
    // Brand-new user: nothing to inject yet.
    assert_eq!(body["memory_injected"], false);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));

    let user = core.storage.users.get("alice").unwrap().unwrap();
    assert_eq!(user.message_count, 1);
    assert_eq!(core.storage.memories.count_for_user("alice").unwrap(), 2);
    assert_eq!(core.storage.chat.count_for_user("alice").unwrap(), 2);
}

#[tokio::test]
async fn test_second_turn_injects_memory() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, core) = test_core(provider.uri(), &temp_dir);

    let (status, _) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "bob", "message": "I love pizza"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "bob", "message": "What do I love?"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["memory_injected"], true);
    assert_eq!(core.storage.memories.count_for_user("bob").unwrap(), 4);
    assert_eq!(core.storage.chat.count_for_user("bob").unwrap(), 4);
}

#[tokio::test]
async fn test_blank_message_is_rejected_before_the_core() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "carol", "message": "   "}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], 422);
    // Rejected before any store write.
    assert!(core.storage.users.get("carol").unwrap().is_none());
}

#[tokio::test]
async fn test_provider_failure_aborts_the_turn() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&provider)
        .await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "dave", "message": "Hello"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("upstream down")
    );

    // The user row was auto-committed before the failure point, but no
    // conversation state was.
    assert!(core.storage.users.get("dave").unwrap().is_some());
    assert_eq!(core.storage.memories.count_for_user("dave").unwrap(), 0);
    assert_eq!(core.storage.chat.count_for_user("dave").unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_provider_is_a_validation_failure() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "erin", "message": "Hi", "provider": "pollinations"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("pollinations")
    );
}

#[tokio::test]
async fn test_get_user_404_when_absent() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = get(&router, "/api/v1/user/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "User not found");
}

#[tokio::test]
async fn test_preferences_roundtrip() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = post_json(
        &router,
        "/api/v1/user/frank/preferences",
        json!({"language": "fr", "system_prompt": "Be concise"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["language"], "fr");

    let (status, body) = get(&router, "/api/v1/user/frank").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["language"], "fr");
    assert_eq!(body["system_prompt"], "Be concise");
    assert_eq!(body["message_count"], 0);
}

#[tokio::test]
async fn test_prune_endpoint_reports_exact_count() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, core) = test_core(provider.uri(), &temp_dir);

    let mut old = recall_storage::MemoryRecord::new(
        "gina",
        recall_storage::MemoryType::ShortTerm,
        "stale",
        2,
        None,
        vec![],
    );
    old.created_at = chrono::Utc::now() - chrono::Duration::days(45);
    core.storage.memories.insert(&old).unwrap();

    let mut keeper = recall_storage::MemoryRecord::new(
        "gina",
        recall_storage::MemoryType::LongTerm,
        "precious",
        9,
        None,
        vec![],
    );
    keeper.created_at = chrono::Utc::now() - chrono::Duration::days(45);
    core.storage.memories.insert(&keeper).unwrap();

    // Conditional prune spares the important record.
    let (status, body) = post_json(
        &router,
        "/api/v1/memory/prune",
        json!({"user_id": "gina", "retention_days": 30, "min_importance": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pruned_count"], 1);

    // Unconditional prune takes the rest; a repeat deletes nothing.
    let (_, body) = post_json(
        &router,
        "/api/v1/memory/prune",
        json!({"user_id": "gina", "retention_days": 30}),
    )
    .await;
    assert_eq!(body["pruned_count"], 1);

    let (_, body) = post_json(
        &router,
        "/api/v1/memory/prune",
        json!({"user_id": "gina"}),
    )
    .await;
    assert_eq!(body["pruned_count"], 0);
    assert_eq!(body["retention_days"], 30);
}

#[tokio::test]
async fn test_summarize_endpoint() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    // No such user yet.
    let (status, _) = post_json(
        &router,
        "/api/v1/memory/summarize",
        json!({"user_id": "hana"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "hana", "message": "Hi"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &router,
        "/api/v1/memory/summarize",
        json!({"user_id": "hana"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "USER: Hi | ASSISTANT: Hello from the mock");
}

#[tokio::test]
async fn test_list_memories_newest_first() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    let (status, _) = post_json(
        &router,
        "/api/v1/chat",
        json!({"user_id": "iris", "message": "Remember my plan"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&router, "/api/v1/memory/iris").await;
    assert_eq!(status, StatusCode::OK);
    let memories = body.as_array().unwrap();
    assert_eq!(memories.len(), 2);
    assert!(memories.iter().all(|m| m["memory_type"] == "short_term"));
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let provider = mock_provider().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let (router, _core) = test_core(provider.uri(), &temp_dir);

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], json!(["openai"]));
}
