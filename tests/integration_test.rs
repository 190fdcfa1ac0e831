//! Integration tests for Jarvis
//!
//! These tests drive the orchestrator against an on-disk store and check
//! the behavior across crates:
//! - jarvis-memory: persistence across store reopen
//! - jarvis-tools: order and grocery tools dispatched from LLM tool calls
//! - jarvis-core: approval workflow, fact extraction and session lifecycle

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jarvis_core::orders::is_legal_transition;
use jarvis_core::{
    Error, FactMerger, MemoryExtractor, Orchestrator, OrchestratorConfig, RetryConfig,
    RuleBasedExtractor, Transcript, TurnStatus, FALLBACK_APOLOGY,
};
use jarvis_llm::{MockProvider, ToolCall, ToolCompletionResponse};
use jarvis_memory::{MemoryStore, OrderFilter, OrderStatus, Role, SqliteStore, User};
use jarvis_tools::{register_builtins, ToolRegistry};
use serde_json::json;

async fn open_store(path: &Path) -> Arc<dyn MemoryStore> {
    Arc::new(SqliteStore::from_path(path).await.unwrap())
}

fn orchestrator(provider: Arc<MockProvider>, store: Arc<dyn MemoryStore>) -> Orchestrator {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);

    let config = OrchestratorConfig::default().with_retry(
        RetryConfig::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false),
    );
    Orchestrator::new(provider, Arc::new(registry), store, config)
        .with_extractor(Arc::new(RuleBasedExtractor::new()))
}

#[tokio::test]
async fn test_large_order_waits_for_parent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("jarvis.db")).await;

    let maid = User::new("echo-kitchen", "Sunita", Role::Maid);
    let parent = User::new("echo-bedroom", "Ravi", Role::Adult);
    store.create_user(&maid).await.unwrap();
    store.create_user(&parent).await.unwrap();

    let provider = Arc::new(MockProvider::new());
    provider.add_tool_call(
        "create_order_request",
        json!({"order_type": "grocery", "items": [{"name": "basmati rice", "quantity": 10, "unit": "kg", "estimated_price": 500}]}),
    );
    provider.add_text_response("I've asked Ravi to approve the rice order.");
    let jarvis = orchestrator(Arc::clone(&provider), Arc::clone(&store));

    let outcome = jarvis
        .handle_turn("echo-kitchen", "order ten kilos of basmati rice", "session-rice")
        .await;
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.tool_calls[0].output["status"], "pending");

    let pending = jarvis.workflow().pending_for_approver(&parent).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].total_amount, 5000.0);

    let approved = jarvis.workflow().approve(pending[0].id, &parent).await.unwrap();
    assert_eq!(approved.status, OrderStatus::Approved);
    assert_eq!(approved.approved_by, Some(parent.id));

    jarvis
        .workflow()
        .mark_ordered(approved.id, "BB-1042")
        .await
        .unwrap();
    let delivered = jarvis.workflow().mark_delivered(approved.id).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);

    assert!(!is_legal_transition(OrderStatus::Delivered, OrderStatus::Pending));
    let err = jarvis
        .workflow()
        .approve(approved.id, &parent)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_small_order_approves_itself() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("jarvis.db")).await;

    let provider = Arc::new(MockProvider::new());
    provider.add_tool_call(
        "create_order_request",
        json!({"order_type": "grocery", "items": [{"name": "tomatoes", "quantity": 1, "unit": "kg", "estimated_price": 50}]}),
    );
    provider.add_text_response("Tomatoes are on the way.");
    let jarvis = orchestrator(Arc::clone(&provider), Arc::clone(&store));

    jarvis
        .handle_turn("echo-living-room", "order a kilo of tomatoes", "session-tomato")
        .await;

    let orders = store.list_orders(&OrderFilter::default()).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Approved);
    assert!(orders[0].approved_by.is_none());
}

#[tokio::test]
async fn test_facts_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("jarvis.db");

    {
        let provider = Arc::new(MockProvider::new());
        provider.add_text_response("That's sweet!");
        let jarvis = orchestrator(Arc::clone(&provider), open_store(&db_path).await);
        jarvis
            .handle_turn("echo-kitchen", "my son loves chocolate cake", "session-1")
            .await;
        jarvis.end_session("session-1").await.unwrap();
    }

    let provider = Arc::new(MockProvider::new());
    provider.add_text_response("He loves chocolate cake.");
    let jarvis = orchestrator(Arc::clone(&provider), open_store(&db_path).await);
    let outcome = jarvis
        .handle_turn("echo-kitchen", "what cake should I bake for my son", "session-2")
        .await;
    assert_eq!(outcome.spoken_text, "He loves chocolate cake.");

    let system = &provider.recorded_requests()[0].request.messages[0].content;
    assert!(system.contains("son loves chocolate cake"));
}

#[tokio::test]
async fn test_round_bound_against_disk_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("jarvis.db")).await;

    let provider = Arc::new(MockProvider::new().with_fallback(ToolCompletionResponse::calls(
        vec![ToolCall::new("call_time", "get_current_time", "{}")],
    )));
    let jarvis = orchestrator(Arc::clone(&provider), Arc::clone(&store));

    let outcome = jarvis
        .handle_turn("echo-kitchen", "what time is it", "session-loop")
        .await;

    assert_eq!(outcome.status, TurnStatus::RoundLimit);
    assert_eq!(outcome.spoken_text, FALLBACK_APOLOGY);
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("jarvis.db")).await;
    let user = User::new("echo-kitchen", "Ravi", Role::Adult);
    store.create_user(&user).await.unwrap();

    let memory = MemoryExtractor::new(
        Arc::new(RuleBasedExtractor::new()),
        FactMerger::new(Arc::clone(&store), 0.8),
    );
    let transcript = Transcript::turn(
        user.id,
        None,
        "my son loves chocolate cake",
        "That's lovely!",
    );

    memory.process(&transcript).await.unwrap();
    memory.process(&transcript).await.unwrap();

    let facts = store.list_facts(user.id).await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].reference_count, 2);
}

#[tokio::test]
async fn test_message_count_matches_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir.path().join("jarvis.db")).await;

    let provider = Arc::new(MockProvider::new());
    provider.add_tool_call(
        "add_to_grocery_list",
        json!({"items": [{"name": "milk", "quantity": 2}]}),
    );
    provider.add_text_response("Added milk.");
    provider.add_text_response("You have milk on the list.");
    let jarvis = orchestrator(Arc::clone(&provider), Arc::clone(&store));

    let first = jarvis
        .handle_turn("echo-kitchen", "add two milk to the list", "session-count")
        .await;
    jarvis
        .handle_turn("echo-kitchen", "what's on my grocery list", "session-count")
        .await;

    let conversation_id = first.conversation_id.unwrap();
    let rows = store.count_messages(conversation_id).await.unwrap();
    let conversation = store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.message_count, rows);
    // user, tool, assistant, user, assistant
    assert_eq!(rows, 5);
}
