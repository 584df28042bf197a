use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_api::{
    build_router,
    cache::{CacheEntry, CacheError, CacheStore, MemoryCache},
    config::Config,
    state::AppState,
};
use campus_persist::{seed, MemoryStore, SequenceGenerator};

fn app() -> Router {
    let state = AppState::new(
        Config::default(),
        Arc::new(MemoryStore::with_fixtures(seed::fixtures())),
        Arc::new(MemoryCache::new(100)),
        Arc::new(SequenceGenerator::new("id")),
    );
    build_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["store"], "connected");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

// Threads

#[tokio::test]
async fn test_get_thread_returns_requested_id() {
    let app = app();
    for id in ["thread-rust", "thread-ownership", "thread-algorithms"] {
        let (status, body) = send(&app, Method::GET, &format!("/threads/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
    }
}

#[tokio::test]
async fn test_unknown_thread_is_not_found_for_get_put_delete() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/threads/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));

    let (status, _) = send(&app, Method::PUT, "/threads/nope", Some(json!({"active": false}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/threads/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_thread_merges_fields() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/threads/thread-algorithms",
        Some(json!({"description": "Graphs this week", "conceptTags": ["graphs"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Graphs this week");
    assert_eq!(body["conceptTags"], json!(["graphs"]));
    assert_eq!(body["name"], "Algorithms Study Group");
}

#[tokio::test]
async fn test_update_thread_rejects_empty_name() {
    let app = app();
    let (status, _) = send(&app, Method::PUT, "/threads/thread-rust", Some(json!({"name": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_thread_keeps_conversations() {
    let app = app();

    let (status, _) = send(&app, Method::DELETE, "/threads/thread-ownership", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, "/threads/thread-ownership", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, parent) = send(&app, Method::GET, "/threads/thread-rust", None).await;
    assert_eq!(parent["subThreadIds"], json!([]));

    let (_, conversations) =
        send(&app, Method::GET, "/threads/thread-ownership/conversations", None).await;
    assert_eq!(conversations.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_child_thread_links_parent() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/threads",
        Some(json!({"name": "Traits", "parentThreadId": "thread-rust"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "id-1");
    assert_eq!(body["active"], true);

    let (_, parent) = send(&app, Method::GET, "/threads/thread-rust", None).await;
    assert_eq!(parent["subThreadIds"], json!(["thread-ownership", "id-1"]));

    let (_, children) = send(&app, Method::GET, "/threads?parentThreadId=thread-rust", None).await;
    assert_eq!(children.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_thread_validation() {
    let app = app();

    let (status, _) = send(&app, Method::POST, "/threads", Some(json!({"description": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/threads",
        Some(json!({"name": "Lost", "parentThreadId": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// Conversations

#[tokio::test]
async fn test_conversation_without_title_is_rejected_without_side_effect() {
    let app = app();
    let uri = "/threads/thread-algorithms/conversations";

    let (_, before) = send(&app, Method::GET, uri, None).await;
    let (status, body) = send(&app, Method::POST, uri, Some(json!({"participantIds": ["user-3"]}))).await;
    let (_, after) = send(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));
    assert_eq!(before.as_array().unwrap().len(), after.as_array().unwrap().len());
}

#[tokio::test]
async fn test_create_conversation_defaults_participants() {
    let app = app();
    let uri = "/threads/thread-rust/conversations";

    let (status, body) = send(&app, Method::POST, uri, Some(json!({"title": "Macros"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["threadId"], "thread-rust");
    assert_eq!(body["participantIds"], json!(["user-1"]));
    assert_eq!(body["startedAt"], body["lastActivityAt"]);

    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_conversation_dedups_participants() {
    let app = app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/threads/thread-rust/conversations",
        Some(json!({"title": "Pairs", "participantIds": ["user-2", "user-3", "user-2"]})),
    )
    .await;
    assert_eq!(body["participantIds"], json!(["user-2", "user-3"]));
}

#[tokio::test]
async fn test_create_conversation_in_unknown_thread() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/threads/ghost/conversations",
        Some(json!({"title": "Hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = send(&app, Method::GET, "/threads/ghost/conversations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_conversation_without_body_is_bad_request() {
    let app = app();
    let uri = "/threads/thread-rust/conversations";

    let (status, body) = send(&app, Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_mistyped_and_malformed_bodies_are_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/threads/thread-rust/conversations",
        Some(json!({"title": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/threads/thread-rust",
        Some(json!({"active": "yes"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/cache")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"key\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

// Messages

fn assert_sorted(messages: &Value) {
    let stamps: Vec<chrono::DateTime<chrono::Utc>> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["timestamp"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_messages_are_in_timestamp_order() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/conversations/conv-borrowck/messages", None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["msg-1", "msg-2", "msg-3"]);
    assert_sorted(&body);
}

#[tokio::test]
async fn test_posted_message_is_visible_and_ordered() {
    let app = app();
    let uri = "/conversations/conv-quicksort/messages";

    let (status, created) = send(
        &app,
        Method::POST,
        uri,
        Some(json!({
            "content": {"code": "pivot = median_of_three(xs)", "language": "python"},
            "messageType": "code",
            "replyToMessageId": "msg-5"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["threadId"], "thread-algorithms");
    assert_eq!(created["userId"], "user-1");
    assert_eq!(created["messageType"], "code");

    let (_, list) = send(&app, Method::GET, uri, None).await;
    let list_arr = list.as_array().unwrap();
    assert_eq!(list_arr.len(), 3);
    assert_eq!(list_arr.last().unwrap()["id"], created["id"]);
    assert_sorted(&list);

    let (_, conversations) =
        send(&app, Method::GET, "/threads/thread-algorithms/conversations", None).await;
    assert_eq!(conversations[0]["lastActivityAt"], created["timestamp"]);
}

#[tokio::test]
async fn test_message_validation() {
    let app = app();
    let uri = "/conversations/conv-borrowck/messages";

    let (status, _) = send(&app, Method::POST, uri, Some(json!({"messageType": "text"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, uri, Some(json!({"content": {"text": "hi"}}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        uri,
        Some(json!({"content": {"text": "hi"}, "messageType": "code"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, Method::GET, uri, None).await;
    assert_eq!(list.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_message_for_unknown_conversation() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/conversations/ghost/messages",
        Some(json!({"content": {"text": "hi"}, "messageType": "text"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// Members

#[tokio::test]
async fn test_members_of_unknown_thread_is_empty() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/threads/nope/members", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_add_member_defaults_role_and_copies_user() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/threads/thread-rust/members",
        Some(json!({"userId": "user-4"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "user-4");
    assert_eq!(body["username"], "alan");
    assert_eq!(body["role"], "member");
    assert_eq!(body["level"], 1);
}

#[tokio::test]
async fn test_add_member_role_override() {
    let app = app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/threads/thread-rust/members",
        Some(json!({"userId": "user-1", "role": "expert"})),
    )
    .await;
    assert_eq!(body["role"], "expert");
}

#[tokio::test]
async fn test_duplicate_member_conflicts_and_keeps_length() {
    let app = app();
    let uri = "/threads/thread-rust/members";

    let (_, before) = send(&app, Method::GET, uri, None).await;
    let (status, _) = send(&app, Method::POST, uri, Some(json!({"userId": "user-2"}))).await;
    let (_, after) = send(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(before.as_array().unwrap().len(), after.as_array().unwrap().len());
}

#[tokio::test]
async fn test_add_member_validation() {
    let app = app();
    let uri = "/threads/thread-rust/members";

    let (status, _) = send(&app, Method::POST, uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, uri, Some(json!({"userId": "nobody"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_join_twice_conflicts_and_leave_removes_one() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/threads/thread-algorithms/join", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "user-1");

    let (status, _) = send(&app, Method::POST, "/threads/thread-algorithms/join", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, members) = send(&app, Method::GET, "/threads/thread-algorithms/members", None).await;
    assert_eq!(members.as_array().unwrap().len(), 3);

    let (status, removed) = send(&app, Method::POST, "/threads/thread-algorithms/leave", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], "user-1");

    let (_, members) = send(&app, Method::GET, "/threads/thread-algorithms/members", None).await;
    let ids: Vec<&str> = members
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["user-3", "user-4"]);

    let (status, _) = send(&app, Method::POST, "/threads/thread-algorithms/leave", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// Cache

#[tokio::test]
async fn test_cache_round_trip_with_default_expiration() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/cache",
        Some(json!({"key": "progress:user-1", "data": {"completed": 4}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["key"], "progress:user-1");

    let expires_at: chrono::DateTime<chrono::Utc> =
        body["expiresAt"].as_str().unwrap().parse().unwrap();
    let remaining = expires_at - chrono::Utc::now();
    assert!(remaining > chrono::Duration::seconds(3500));
    assert!(remaining <= chrono::Duration::seconds(3600));

    let (status, body) = send(&app, Method::GET, "/cache?key=progress:user-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"completed": 4}));
}

#[tokio::test]
async fn test_cache_missing_and_invalid_keys() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/cache?key=absent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/cache", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/cache", Some(json!({"data": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/cache",
        Some(json!({"key": "k", "data": 1, "expiration": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

struct UnavailableCache;

#[async_trait::async_trait]
impl CacheStore for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(
        &self,
        _key: String,
        _data: Value,
        _ttl: std::time::Duration,
    ) -> Result<CacheEntry, CacheError> {
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_cache_backend_failure_is_internal_error() {
    let state = AppState::new(
        Config::default(),
        Arc::new(MemoryStore::with_fixtures(seed::fixtures())),
        Arc::new(UnavailableCache),
        Arc::new(SequenceGenerator::new("id")),
    );
    let app = build_router(Arc::new(state));

    let (status, body) = send(&app, Method::GET, "/cache?key=k", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Cache error");

    let (status, _) = send(&app, Method::POST, "/cache", Some(json!({"key": "k", "data": 1}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
