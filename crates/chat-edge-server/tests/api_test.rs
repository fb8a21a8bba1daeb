//! Router tests over in-memory stores with stub model and context providers.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chat_edge_core::{
    ConversationMessage, ConversationStore, DomainError, ManualClock, MessageRepository,
    RateLimitConfig, RateLimiter,
};
use chat_edge_infrastructure::{InMemoryKeyValueStore, InMemoryMessageRepository};
use chat_edge_server::{
    build_router,
    config::Settings,
    models::{ChatMessage, ContextSnippet},
    services::{ContextProvider, LlmProvider, NoContext},
    AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const START_MS: i64 = 1_760_000_010_000;

/// Replies with the last user message, prefixed.
struct EchoLlm;

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        Ok(format!("echo: {}", last))
    }
}

struct DownLlm;

#[async_trait]
impl LlmProvider for DownLlm {
    async fn generate(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

struct FixedContext;

#[async_trait]
impl ContextProvider for FixedContext {
    async fn search(&self, _query: &str) -> Result<Vec<ContextSnippet>> {
        Ok(vec![ContextSnippet {
            content: "The sky is blue.".to_string(),
            score: 0.8,
            source: Some("facts.md".to_string()),
        }])
    }
}

/// Message table whose every call fails.
struct BrokenRepository;

#[async_trait]
impl MessageRepository for BrokenRepository {
    async fn insert(&self, _message: &ConversationMessage) -> Result<(), DomainError> {
        Err(broken())
    }

    async fn recent(&self, _conversation_id: &str, _limit: usize) -> Result<Vec<ConversationMessage>, DomainError> {
        Err(broken())
    }

    async fn delete_conversation(&self, _conversation_id: &str) -> Result<u64, DomainError> {
        Err(broken())
    }

    async fn delete_except_latest(&self, _conversation_id: &str, _keep: usize) -> Result<u64, DomainError> {
        Err(broken())
    }

    async fn count_conversations(&self) -> Result<u64, DomainError> {
        Err(broken())
    }

    async fn count_messages(&self) -> Result<u64, DomainError> {
        Err(broken())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Err(broken())
    }
}

fn broken() -> DomainError {
    DomainError::Storage("database is down".to_string())
}

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

fn app_with(
    limit: u32,
    repository: Arc<dyn MessageRepository>,
    llm: Arc<dyn LlmProvider>,
    context: Arc<dyn ContextProvider>,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(START_MS));
    let mut settings = Settings::default();
    settings.rate_limit = RateLimitConfig {
        limit,
        ..RateLimitConfig::default()
    };
    settings.conversation.max_history_length = 4;
    settings.conversation.max_message_chars = 100;
    settings.cors.allowed_origins = vec!["https://chat.example.com".to_string()];

    let rate_limiter = Arc::new(RateLimiter::new(
        Arc::new(InMemoryKeyValueStore::new(clock.clone())),
        clock.clone(),
        settings.rate_limit.clone(),
    ));
    let conversations = Arc::new(ConversationStore::new(
        repository,
        clock.clone(),
        settings.conversation.store_config(),
    ));

    let state = AppState::new(settings, clock.clone(), rate_limiter, conversations, llm, context);
    TestApp {
        router: build_router(state),
        clock,
    }
}

fn app(limit: u32) -> TestApp {
    app_with(
        limit,
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(EchoLlm),
        Arc::new(NoContext),
    )
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(5);

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");

    let ready = send(&app, get("/health/ready")).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_when_store_is_down() {
    let app = app_with(5, Arc::new(BrokenRepository), Arc::new(EchoLlm), Arc::new(NoContext));

    let response = send(&app, get("/health/ready")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// **Test: a chat turn stores both messages and reports rate-limit headers.**
#[tokio::test]
async fn test_chat_round_trip() {
    let app = app_with(
        5,
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(EchoLlm),
        Arc::new(FixedContext),
    );

    let response = send(
        &app,
        chat_request(json!({"message": "hello", "conversationId": "c1", "userId": "alice"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "5");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    assert_eq!(response.headers()["x-ratelimit-reset"], "1760000040000");

    let body = json_body(response).await;
    assert_eq!(body["conversationId"], "c1");
    assert_eq!(body["message"]["role"], "assistant");
    assert_eq!(body["message"]["content"], "echo: hello");
    assert_eq!(body["contextSnippets"][0]["source"], "facts.md");
    assert_eq!(body["rateLimit"]["remaining"], 4);
    assert_eq!(body["rateLimit"]["blocked"], false);

    let history = json_body(send(&app, get("/api/conversations/c1")).await).await;
    let roles: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "assistant"]);
    assert!(history.get("degraded").is_none());
}

#[tokio::test]
async fn test_chat_generates_conversation_id() {
    let app = app(5);

    let body = json_body(send(&app, chat_request(json!({"message": "hi"}))).await).await;
    let conversation_id = body["conversationId"].as_str().unwrap();

    assert_eq!(conversation_id.len(), 36);
    assert_eq!(body["message"]["conversationId"], conversation_id);
}

/// **Test: blocked requests get 429 with Retry-After, and the window reopens.**
#[tokio::test]
async fn test_chat_rate_limited() {
    let app = app(2);

    for _ in 0..2 {
        let response = send(&app, chat_request(json!({"message": "hi", "userId": "bob"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&app, chat_request(json!({"message": "hi", "userId": "bob"}))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(response.headers()[header::RETRY_AFTER], "30");
    assert_eq!(json_body(response).await["error"], "RateLimited");

    // Other identifiers have their own window
    let other = send(&app, chat_request(json!({"message": "hi", "userId": "carol"}))).await;
    assert_eq!(other.status(), StatusCode::OK);

    app.clock.set_ms(1_760_000_040_000);
    let reopened = send(&app, chat_request(json!({"message": "hi", "userId": "bob"}))).await;
    assert_eq!(reopened.status(), StatusCode::OK);
    assert_eq!(reopened.headers()["x-ratelimit-remaining"], "1");
}

#[tokio::test]
async fn test_rate_limit_keyed_by_forwarded_ip() {
    let app = app(1);

    let mut first = chat_request(json!({"message": "hi"}));
    first
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
    assert_eq!(send(&app, first).await.status(), StatusCode::OK);

    let mut second = chat_request(json!({"message": "hi"}));
    second
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4, 10.0.0.1".parse().unwrap());
    assert_eq!(send(&app, second).await.status(), StatusCode::TOO_MANY_REQUESTS);

    let mut request = get("/api/rate-limit");
    request
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
    let status = json_body(send(&app, request).await).await;
    assert_eq!(status["remaining"], 0);
    assert_eq!(status["blocked"], true);
}

#[tokio::test]
async fn test_rate_limit_peek_does_not_consume() {
    let app = app(3);

    for _ in 0..2 {
        let response = send(&app, get("/api/rate-limit?userId=dave")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["remaining"], 3);
        assert_eq!(body["resetTime"], 1_760_000_040_000i64);
    }

    send(&app, chat_request(json!({"message": "hi", "userId": "dave"}))).await;
    let body = json_body(send(&app, get("/api/rate-limit?userId=dave")).await).await;
    assert_eq!(body["remaining"], 2);
}

#[tokio::test]
async fn test_chat_validation() {
    let app = app(5);

    let cases = [
        json!({"message": "   "}),
        json!({"message": "x".repeat(101)}),
        json!({"message": "hi", "conversationId": "bad id!"}),
    ];
    for body in cases {
        let response = send(&app, chat_request(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "BadRequest");
    }

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, malformed).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "BadRequest");

    // Rejected requests do not consume quota
    let status = json_body(send(&app, get("/api/rate-limit")).await).await;
    assert_eq!(status["remaining"], 5);
}

#[tokio::test]
async fn test_llm_failure_is_503() {
    let app = app_with(
        5,
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(DownLlm),
        Arc::new(NoContext),
    );

    let response = send(&app, chat_request(json!({"message": "hi", "conversationId": "c1"}))).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "LlmError");
}

/// **Test: history stays bounded at the configured length.**
#[tokio::test]
async fn test_history_is_bounded() {
    let app = app(100);

    for i in 0..5 {
        let body = json!({"message": format!("q{}", i), "conversationId": "c1"});
        assert_eq!(send(&app, chat_request(body)).await.status(), StatusCode::OK);
        app.clock.advance(std::time::Duration::from_millis(1));
    }

    let history = json_body(send(&app, get("/api/conversations/c1")).await).await;
    let contents: Vec<&str> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["q3", "echo: q3", "q4", "echo: q4"]);
}

#[tokio::test]
async fn test_delete_conversation() {
    let app = app(5);
    send(&app, chat_request(json!({"message": "hi", "conversationId": "c1"}))).await;

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/api/conversations/c1")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, delete).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"conversationId": "c1", "deleted": 2}));

    let history = json_body(send(&app, get("/api/conversations/c1")).await).await;
    assert_eq!(history["messages"], json!([]));
}

/// **Test: reads and stats degrade, delete fails loudly.**
#[tokio::test]
async fn test_storage_failures() {
    let app = app_with(5, Arc::new(BrokenRepository), Arc::new(EchoLlm), Arc::new(NoContext));

    let history = send(&app, get("/api/conversations/c1")).await;
    assert_eq!(history.status(), StatusCode::OK);
    let history = json_body(history).await;
    assert_eq!(history["messages"], json!([]));
    assert_eq!(history["degraded"], true);

    let stats = json_body(send(&app, get("/api/stats")).await).await;
    assert_eq!(stats["totalConversations"], 0);
    assert_eq!(stats["degraded"], true);

    let delete = Request::builder()
        .method(Method::DELETE)
        .uri("/api/conversations/c1")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, delete).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "StorageError");

    let chat = send(&app, chat_request(json!({"message": "hi"}))).await;
    assert_eq!(chat.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_stats() {
    let app = app(10);
    send(&app, chat_request(json!({"message": "a", "conversationId": "c1"}))).await;
    send(&app, chat_request(json!({"message": "b", "conversationId": "c2"}))).await;

    let stats = json_body(send(&app, get("/api/stats")).await).await;
    assert_eq!(stats, json!({"totalConversations": 2, "totalMessages": 4}));
}

#[tokio::test]
async fn test_cors_and_unknown_routes() {
    let app = app(5);

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .header(header::ORIGIN, "https://chat.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, preflight).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://chat.example.com"
    );

    let missing = send(&app, get("/api/nope")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await["error"], "NotFound");
}
