use super::*;
use crate::server::build_orchestrator;
use crate::server::config::{AppConfig, LlmBackend};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use jarvis_core::orchestrator::WELCOME_GREETING;
use jarvis_llm::{LlmProvider, MockProvider};
use jarvis_memory::{MemoryStore, OrderItem, OrderType, Role, SqliteStore, User};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    provider: Arc<MockProvider>,
    orchestrator: Arc<Orchestrator>,
}

async fn test_app() -> TestApp {
    let mut config = AppConfig::default();
    config.llm.provider = LlmBackend::Mock;
    config.orchestrator.retry_initial_delay_ms = 1;

    let provider = Arc::new(MockProvider::new());
    let llm: Arc<dyn LlmProvider> = provider.clone();
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let orchestrator = Arc::new(build_orchestrator(&config, llm, store));

    TestApp {
        router: router(Arc::clone(&orchestrator)),
        provider,
        orchestrator,
    }
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn add_user(app: &TestApp, user: &User) {
    app.orchestrator.store().create_user(user).await.unwrap();
}

async fn pending_order(app: &TestApp, requester: &User) -> uuid::Uuid {
    let items = vec![OrderItem {
        name: "Rice".to_string(),
        quantity: 50.0,
        unit: Some("kg".to_string()),
        estimated_price: 100.0,
        notes: None,
    }];
    let order = app
        .orchestrator
        .workflow()
        .create(requester, requester.id, OrderType::Grocery, items, None)
        .await
        .unwrap();
    order.id
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_detailed_health_reports_provider() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health/detailed", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"]["status"], "healthy");
    assert_eq!(body["llm_provider"], "mock");
}

#[tokio::test]
async fn test_turn_returns_spoken_text() {
    let app = test_app().await;
    app.provider.add_text_response("It's 5 PM.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/turn",
        Some(json!({
            "session_id": "amzn-session-1",
            "user_identity": "echo-living-room",
            "utterance_text": "what time is it"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spoken_text"], "It's 5 PM.");
    assert_eq!(body["should_end_session"], false);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_turn_requires_session() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/turn",
        Some(json!({
            "session_id": "  ",
            "user_identity": "echo-living-room",
            "utterance_text": "hello"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.provider.request_count(), 0);
}

#[tokio::test]
async fn test_greeting_for_unknown_caller() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/v1/greeting/echo-new", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spoken_text"], WELCOME_GREETING);
}

#[tokio::test]
async fn test_end_session_by_other_user_forbidden() {
    let app = test_app().await;
    app.provider.add_text_response("Hello!");
    send(
        &app,
        Method::POST,
        "/v1/turn",
        Some(json!({
            "session_id": "s-1",
            "user_identity": "echo-a",
            "utterance_text": "hello there"
        })),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/session/end",
        Some(json!({"session_id": "s-1", "user_identity": "echo-b"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/session/end",
        Some(json!({"session_id": "s-1", "user_identity": "echo-a"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["spoken_text"].as_str().unwrap().starts_with("Goodbye"));
    assert!(app.orchestrator.sessions().find_open("s-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_approve_then_conflict() {
    let app = test_app().await;
    let maid = User::new("echo-kitchen", "Sunita", Role::Maid);
    let parent = User::new("echo-bedroom", "Ravi", Role::Adult);
    add_user(&app, &maid).await;
    add_user(&app, &parent).await;
    let order_id = pending_order(&app, &maid).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/approvers/echo-bedroom/orders",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let uri = format!("/v1/orders/{order_id}/approve");
    let decision = json!({"approver_identity": "echo-bedroom"});
    let (status, body) = send(&app, Method::POST, &uri, Some(decision.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, _) = send(&app, Method::POST, &uri, Some(decision)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_decisions_need_permission_and_reason() {
    let app = test_app().await;
    let maid = User::new("echo-kitchen", "Sunita", Role::Maid);
    let child = User::new("echo-kids-room", "Anu", Role::Child);
    let parent = User::new("echo-bedroom", "Ravi", Role::Adult);
    for user in [&maid, &child, &parent] {
        add_user(&app, user).await;
    }
    let order_id = pending_order(&app, &maid).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/orders/{order_id}/approve"),
        Some(json!({"approver_identity": "echo-kids-room"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/orders/{order_id}/reject"),
        Some(json!({"approver_identity": "echo-bedroom"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/orders/{order_id}/reject"),
        Some(json!({"approver_identity": "echo-bedroom", "reason": "too much rice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
}

#[tokio::test]
async fn test_unknown_order_and_approver() {
    let app = test_app().await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = send(&app, Method::GET, &format!("/v1/orders/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/orders/{missing}/approve"),
        Some(json!({"approver_identity": "nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
