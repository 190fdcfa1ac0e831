//! Orchestrator tests

use super::*;
use crate::error::{Error, Result, FALLBACK_APOLOGY};
use crate::extractor::{Candidate, FactExtractor, RuleBasedExtractor, Transcript};
use crate::utils::RetryConfig;
use chrono::{DateTime, Utc};
use jarvis_llm::{MessageRole, MockProvider, ToolCall, ToolCompletionResponse};
use jarvis_memory::{
    Conversation, ConversationMessage, Fact, GroceryItem, Importance, MemoryStore, NewMessage,
    Order, OrderFilter, OrderStatus, Preference, PreferenceObservation, Reminder, ReminderFilter,
    Role, SqliteStore, User,
};
use jarvis_tools::{register_builtins, ToolRegistry};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    orchestrator: Orchestrator,
    provider: Arc<MockProvider>,
    store: Arc<dyn MemoryStore>,
}

async fn harness_with(provider: MockProvider, config: OrchestratorConfig) -> Harness {
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    harness_over(provider, config, store)
}

fn harness_over(
    provider: MockProvider,
    config: OrchestratorConfig,
    store: Arc<dyn MemoryStore>,
) -> Harness {
    let provider = Arc::new(provider);
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);

    let config = config.with_retry(
        RetryConfig::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false),
    );
    let orchestrator = Orchestrator::new(
        provider.clone(),
        Arc::new(registry),
        Arc::clone(&store),
        config,
    )
    .with_extractor(Arc::new(RuleBasedExtractor::new()));

    Harness {
        orchestrator,
        provider,
        store,
    }
}

async fn harness() -> Harness {
    harness_with(MockProvider::new(), OrchestratorConfig::default()).await
}

/// SQLite store whose message appends can be made to fail by role
struct FlakyStore {
    inner: SqliteStore,
    failing_role: Mutex<Option<MessageRole>>,
}

impl FlakyStore {
    async fn new() -> Self {
        Self {
            inner: SqliteStore::in_memory().await.unwrap(),
            failing_role: Mutex::new(None),
        }
    }

    fn fail_appends_for(&self, role: MessageRole) {
        *self.failing_role.lock().unwrap() = Some(role);
    }
}

type StoreResult<T> = jarvis_memory::Result<T>;

#[async_trait::async_trait]
impl MemoryStore for FlakyStore {
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn get_user_by_identity(&self, identity: &str) -> StoreResult<Option<User>> {
        self.inner.get_user_by_identity(identity).await
    }
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        self.inner.create_user(user).await
    }
    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.inner.update_user(user).await
    }
    async fn touch_user(&self, id: Uuid, new_conversation: bool) -> StoreResult<()> {
        self.inner.touch_user(id, new_conversation).await
    }
    async fn list_approvers(&self) -> StoreResult<Vec<User>> {
        self.inner.list_approvers().await
    }
    async fn insert_fact(&self, fact: &Fact) -> StoreResult<()> {
        self.inner.insert_fact(fact).await
    }
    async fn list_facts(&self, user_id: Uuid) -> StoreResult<Vec<Fact>> {
        self.inner.list_facts(user_id).await
    }
    async fn increment_fact_reference(
        &self,
        fact_id: Uuid,
        raise_to: Option<Importance>,
    ) -> StoreResult<Fact> {
        self.inner.increment_fact_reference(fact_id, raise_to).await
    }
    async fn upsert_preference(
        &self,
        observation: &PreferenceObservation,
    ) -> StoreResult<Preference> {
        self.inner.upsert_preference(observation).await
    }
    async fn get_preference(
        &self,
        user_id: Uuid,
        category: &str,
        key: &str,
    ) -> StoreResult<Option<Preference>> {
        self.inner.get_preference(user_id, category, key).await
    }
    async fn list_preferences(&self, user_id: Uuid) -> StoreResult<Vec<Preference>> {
        self.inner.list_preferences(user_id).await
    }
    async fn create_conversation(&self, conversation: &Conversation) -> StoreResult<()> {
        self.inner.create_conversation(conversation).await
    }
    async fn get_conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        self.inner.get_conversation(id).await
    }
    async fn find_open_conversation(&self, session_id: &str) -> StoreResult<Option<Conversation>> {
        self.inner.find_open_conversation(session_id).await
    }
    async fn close_conversation(
        &self,
        id: Uuid,
        summary: Option<&str>,
    ) -> StoreResult<Conversation> {
        self.inner.close_conversation(id, summary).await
    }
    async fn recent_summaries(&self, user_id: Uuid, limit: u32) -> StoreResult<Vec<String>> {
        self.inner.recent_summaries(user_id, limit).await
    }
    async fn append_message(
        &self,
        conversation_id: Uuid,
        message: &NewMessage,
    ) -> StoreResult<ConversationMessage> {
        let failing = *self.failing_role.lock().unwrap();
        if failing == Some(message.role) {
            return Err(jarvis_memory::Error::Internal("disk full".to_string()));
        }
        self.inner.append_message(conversation_id, message).await
    }
    async fn list_messages(&self, conversation_id: Uuid) -> StoreResult<Vec<ConversationMessage>> {
        self.inner.list_messages(conversation_id).await
    }
    async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: u32,
    ) -> StoreResult<Vec<ConversationMessage>> {
        self.inner.recent_messages(conversation_id, limit).await
    }
    async fn count_messages(&self, conversation_id: Uuid) -> StoreResult<i64> {
        self.inner.count_messages(conversation_id).await
    }
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.inner.insert_order(order).await
    }
    async fn get_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        self.inner.get_order(id).await
    }
    async fn update_order_if_status(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> StoreResult<bool> {
        self.inner.update_order_if_status(order, expected).await
    }
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        self.inner.list_orders(filter).await
    }
    async fn approved_spend_since(
        &self,
        requested_by: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<f64> {
        self.inner.approved_spend_since(requested_by, since).await
    }
    async fn insert_reminder(&self, reminder: &Reminder) -> StoreResult<()> {
        self.inner.insert_reminder(reminder).await
    }
    async fn list_reminders(
        &self,
        user_id: Uuid,
        filter: &ReminderFilter,
    ) -> StoreResult<Vec<Reminder>> {
        self.inner.list_reminders(user_id, filter).await
    }
    async fn add_grocery_item(&self, item: &GroceryItem) -> StoreResult<GroceryItem> {
        self.inner.add_grocery_item(item).await
    }
    async fn list_grocery_items(
        &self,
        user_id: Uuid,
        include_purchased: bool,
    ) -> StoreResult<Vec<GroceryItem>> {
        self.inner.list_grocery_items(user_id, include_purchased).await
    }
    async fn mark_grocery_purchased(&self, user_id: Uuid, name: &str) -> StoreResult<u64> {
        self.inner.mark_grocery_purchased(user_id, name).await
    }
}

struct BrokenExtractor;

#[async_trait::async_trait]
impl FactExtractor for BrokenExtractor {
    fn name(&self) -> &str {
        "broken"
    }

    async fn extract(&self, _transcript: &Transcript) -> Result<Vec<Candidate>> {
        Err(Error::Extraction("model returned nonsense".to_string()))
    }
}

fn tool_names(request: &jarvis_llm::ToolCompletionRequest) -> Vec<String> {
    request.tools.iter().map(|t| t.name.clone()).collect()
}

#[test]
fn test_orchestrator_config() {
    let config = OrchestratorConfig::new()
        .with_max_tool_rounds(0)
        .with_history_window(8)
        .with_extraction(false);

    assert_eq!(config.max_tool_rounds, 1);
    assert_eq!(config.history_window, 8);
    assert!(!config.extraction_enabled);
}

#[test]
fn test_turn_status_serde() {
    assert_eq!(
        serde_json::to_string(&TurnStatus::RoundLimit).unwrap(),
        "\"round_limit\""
    );
}

#[tokio::test]
async fn test_simple_answer() {
    let h = harness().await;
    h.provider.add_text_response("It's sunny in Pune today.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "how's the weather", "session-1")
        .await;

    assert_eq!(outcome.spoken_text, "It's sunny in Pune today.");
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.rounds, 1);
    assert!(!outcome.should_end_session);

    let conversation_id = outcome.conversation_id.unwrap();
    let conversation = h.store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.message_count, 2);
    assert_eq!(h.store.count_messages(conversation_id).await.unwrap(), 2);

    let sent = h.provider.recorded_requests();
    let messages = &sent[0].request.messages;
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages.last().unwrap().content, "how's the weather");
}

#[tokio::test]
async fn test_round_bound_is_exact() {
    let looping = MockProvider::new().with_fallback(ToolCompletionResponse::calls(vec![
        ToolCall::new("call_loop", "get_current_time", "{}"),
    ]));
    let h = harness_with(looping, OrchestratorConfig::default().with_max_tool_rounds(5)).await;

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "what time is it", "session-loop")
        .await;

    assert_eq!(outcome.status, TurnStatus::RoundLimit);
    assert_eq!(outcome.spoken_text, FALLBACK_APOLOGY);
    assert_eq!(outcome.rounds, 5);
    assert_eq!(outcome.tool_calls.len(), 5);
    assert_eq!(h.provider.request_count(), 5);

    // user + 5 tool results + fallback reply
    let conversation_id = outcome.conversation_id.unwrap();
    assert_eq!(h.store.count_messages(conversation_id).await.unwrap(), 7);
    let conversation = h.store.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.message_count, 7);
}

#[tokio::test]
async fn test_tool_error_fed_back() {
    let h = harness().await;
    h.provider.add_tool_call("calculator", json!({"expression": "10 / 0"}));
    h.provider.add_text_response("I can't divide by zero.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "what is ten divided by zero", "session-calc")
        .await;

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.spoken_text, "I can't divide by zero.");
    assert_eq!(outcome.tool_calls.len(), 1);
    assert!(!outcome.tool_calls[0].success);

    let second = &h.provider.recorded_requests()[1];
    let tool_message = second.request.messages.last().unwrap();
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert!(tool_message.content.contains("execution_failed"));
    let assistant = &second.request.messages[second.request.messages.len() - 2];
    assert_eq!(assistant.tool_calls.len(), 1);
}

#[tokio::test]
async fn test_malformed_arguments_become_invalid_args() {
    let h = harness().await;
    h.provider.add_tool_response(ToolCompletionResponse::calls(vec![ToolCall::new(
        "call_bad",
        "calculator",
        "{expression: 2+2",
    )]));
    h.provider.add_text_response("Sorry, let me try that again later.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "what is two plus two", "session-bad")
        .await;

    assert_eq!(outcome.tool_calls.len(), 1);
    assert_eq!(outcome.tool_calls[0].output["error"]["kind"], "invalid_args");
}

#[tokio::test]
async fn test_transport_failure_retried_once_then_apology() {
    let h = harness().await;
    h.provider.add_error(jarvis_llm::Error::Network("connection reset".into()));
    h.provider.add_error(jarvis_llm::Error::Network("connection reset".into()));

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "hello jarvis", "session-down")
        .await;

    assert_eq!(outcome.status, TurnStatus::LlmUnavailable);
    assert_eq!(outcome.spoken_text, FALLBACK_APOLOGY);
    assert_eq!(h.provider.request_count(), 2);

    // The turn is persisted up to the failure
    let messages = h
        .store
        .list_messages(outcome.conversation_id.unwrap())
        .await
        .unwrap();
    assert_eq!(messages[0].content, "hello jarvis");
}

#[tokio::test]
async fn test_transport_failure_recovers_on_retry() {
    let h = harness().await;
    h.provider.add_error(jarvis_llm::Error::RateLimit);
    h.provider.add_text_response("Hello!");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "hello jarvis", "session-retry")
        .await;
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.spoken_text, "Hello!");
}

#[tokio::test]
async fn test_llm_timeout_is_apology() {
    let h = harness_with(
        MockProvider::new(),
        OrchestratorConfig::default().with_llm_timeout(Duration::from_millis(20)),
    )
    .await;
    h.provider
        .add_delayed_response(Duration::from_secs(5), ToolCompletionResponse::text("late"));
    h.provider
        .add_delayed_response(Duration::from_secs(5), ToolCompletionResponse::text("late"));

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "hello jarvis", "session-slow")
        .await;
    assert_eq!(outcome.status, TurnStatus::LlmUnavailable);
}

#[tokio::test]
async fn test_empty_reply_fallback() {
    let h = harness().await;
    h.provider.add_text_response("   ");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "hmm", "session-empty")
        .await;
    assert_eq!(outcome.spoken_text, EMPTY_REPLY);
}

#[tokio::test]
async fn test_long_reply_truncated() {
    let h = harness_with(
        MockProvider::new(),
        OrchestratorConfig::default().with_max_response_chars(40),
    )
    .await;
    h.provider
        .add_text_response("Tomatoes are on the list. I also added onions and a dozen eggs for you.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "add tomatoes", "session-long")
        .await;
    assert_eq!(outcome.spoken_text, "Tomatoes are on the list.");
}

#[tokio::test]
async fn test_child_never_sees_order_tool() {
    let h = harness().await;
    let child = User::new("echo-kids-room", "Anu", Role::Child);
    h.store.create_user(&child).await.unwrap();
    h.provider.add_tool_call(
        "create_order_request",
        json!({"order_type": "other", "items": [{"name": "toy car", "quantity": 1, "estimated_price": 300}]}),
    );
    h.provider.add_text_response("Please ask a parent for that.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kids-room", "buy me a toy car", "session-child")
        .await;

    let names = tool_names(&h.provider.recorded_requests()[0]);
    assert!(!names.contains(&"create_order_request".to_string()));
    assert!(names.contains(&"get_current_time".to_string()));

    // Even if the model calls it anyway, dispatch refuses
    assert!(!outcome.tool_calls[0].success);
    let orders = h.store.list_orders(&OrderFilter::default()).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_small_order_auto_approved_through_tool() {
    let h = harness().await;
    h.provider.add_tool_call(
        "create_order_request",
        json!({"order_type": "grocery", "items": [{"name": "tomatoes", "quantity": 1, "unit": "kg", "estimated_price": 50}]}),
    );
    h.provider.add_text_response("Done, tomatoes are ordered.");

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "order tomatoes for 50 rupees", "session-order")
        .await;

    assert!(outcome.tool_calls[0].success);
    assert_eq!(outcome.tool_calls[0].output["status"], "approved");
    let orders = h.store.list_orders(&OrderFilter::default()).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Approved);
    assert_eq!(orders[0].total_amount, 50.0);
}

#[tokio::test]
async fn test_fact_surfaces_in_next_turn() {
    let h = harness().await;
    h.provider.add_text_response("That's lovely!");
    h.provider.add_text_response("Your son loves chocolate cake.");

    h.orchestrator
        .handle_turn("echo-kitchen", "my son loves chocolate cake", "session-a")
        .await;
    h.orchestrator
        .handle_turn("echo-kitchen", "what does my son love", "session-b")
        .await;

    let user = h
        .store
        .get_user_by_identity("echo-kitchen")
        .await
        .unwrap()
        .unwrap();
    let facts = h.store.list_facts(user.id).await.unwrap();
    assert_eq!(facts.len(), 1);

    let second = &h.provider.recorded_requests()[1];
    let system = &second.request.messages[0].content;
    assert!(system.contains("THINGS YOU KNOW ABOUT THIS USER"));
    assert!(system.contains("son loves chocolate cake"));
}

#[tokio::test]
async fn test_farewell_ends_session() {
    let h = harness().await;
    h.provider.add_text_response("Hi Ravi.");
    let first = h
        .orchestrator
        .handle_turn("echo-kitchen", "hello", "session-bye")
        .await;

    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "Goodbye Jarvis!", "session-bye")
        .await;

    assert!(outcome.should_end_session);
    assert_eq!(outcome.status, TurnStatus::Farewell);
    assert_eq!(outcome.spoken_text, FAREWELL_REPLY);
    assert_eq!(outcome.conversation_id, first.conversation_id);
    assert_eq!(h.provider.request_count(), 1);

    let conversation = h
        .store
        .get_conversation(first.conversation_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(conversation.is_closed());
    assert_eq!(conversation.message_count, 4);
}

#[tokio::test]
async fn test_end_session_summary_and_greeting() {
    let h = harness().await;
    assert_eq!(
        h.orchestrator.greeting("echo-kitchen").await.unwrap(),
        WELCOME_GREETING
    );

    h.provider.add_text_response("Added to the list.");
    h.provider.add_text_response("You have milk and bread on the list.");
    h.orchestrator
        .handle_turn("echo-kitchen", "add milk to the grocery list", "session-sum")
        .await;
    h.orchestrator
        .handle_turn("echo-kitchen", "what's on the grocery list", "session-sum")
        .await;

    let user = h
        .store
        .get_user_by_identity("echo-kitchen")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        h.orchestrator.greeting("echo-kitchen").await.unwrap(),
        "Hi Friend! How can I help you today?"
    );

    h.provider
        .add_completion(Ok("Ravi added milk and checked the grocery list.".to_string()));
    let closed = h
        .orchestrator
        .end_session("session-sum")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        closed.summary.as_deref(),
        Some("Ravi added milk and checked the grocery list.")
    );
    assert!(h.orchestrator.end_session("session-sum").await.unwrap().is_none());

    let user_after = h.store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(user_after.total_conversations, user.total_conversations + 1);
    assert_eq!(
        h.orchestrator.greeting("echo-kitchen").await.unwrap(),
        "Hi Friend! Good to talk to you again. How can I help?"
    );

    // A new turn on the same session id starts a fresh conversation
    h.provider.add_text_response("Hello again.");
    let next = h
        .orchestrator
        .handle_turn("echo-kitchen", "hello", "session-sum")
        .await;
    assert_ne!(next.conversation_id, Some(closed.id));
}

#[tokio::test]
async fn test_short_session_closes_without_summary() {
    let h = harness().await;
    h.provider.add_text_response("Hi!");
    h.orchestrator
        .handle_turn("echo-kitchen", "hello", "session-short")
        .await;

    let closed = h
        .orchestrator
        .end_session("session-short")
        .await
        .unwrap()
        .unwrap();
    assert!(closed.summary.is_none());
    assert!(h.provider.recorded_completions().is_empty());
}

#[tokio::test]
async fn test_foreign_session_is_refused() {
    let h = harness().await;
    h.provider.add_text_response("Hi!");
    h.orchestrator
        .handle_turn("echo-kitchen", "hello", "session-shared")
        .await;

    let outcome = h
        .orchestrator
        .handle_turn("echo-bedroom", "hello", "session-shared")
        .await;
    assert_eq!(outcome.status, TurnStatus::Degraded);
    assert_eq!(outcome.spoken_text, "Sorry, you're not allowed to do that.");
    assert_eq!(h.provider.request_count(), 1);
}

#[tokio::test]
async fn test_lost_tool_message_degrades_turn() {
    let store = Arc::new(FlakyStore::new().await);
    store.fail_appends_for(MessageRole::Tool);
    let h = harness_over(MockProvider::new(), OrchestratorConfig::default(), store);
    h.provider.add_tool_call("get_current_time", json!({}));
    h.provider.add_text_response("It's noon.");

    let outcome = h
        .orchestrator
        .handle_turn(
            "echo-kitchen",
            "my son loves chocolate cake, what time is it",
            "session-flaky",
        )
        .await;

    assert_eq!(outcome.status, TurnStatus::Degraded);
    assert_eq!(outcome.spoken_text, "It's noon.");
    assert_eq!(outcome.tool_calls.len(), 1);

    let conversation_id = outcome.conversation_id.unwrap();
    let roles: Vec<MessageRole> = h
        .store
        .list_messages(conversation_id)
        .await
        .unwrap()
        .iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);

    // degraded turns skip extraction
    let user = h.store.get_user_by_identity("echo-kitchen").await.unwrap().unwrap();
    assert!(h.store.list_facts(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_lost_farewell_message_degrades_turn() {
    let store = Arc::new(FlakyStore::new().await);
    let h = harness_over(
        MockProvider::new(),
        OrchestratorConfig::default(),
        store.clone(),
    );
    h.provider.add_text_response("Hi Ravi.");
    h.orchestrator
        .handle_turn("echo-kitchen", "hello", "session-flaky-bye")
        .await;

    store.fail_appends_for(MessageRole::Assistant);
    let outcome = h
        .orchestrator
        .handle_turn("echo-kitchen", "goodbye", "session-flaky-bye")
        .await;

    assert_eq!(outcome.status, TurnStatus::Degraded);
    assert!(outcome.should_end_session);
    assert_eq!(outcome.spoken_text, FAREWELL_REPLY);
    assert!(h
        .orchestrator
        .sessions()
        .find_open("session-flaky-bye")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_failed_extraction_keeps_reply() {
    let h = harness().await;
    let orchestrator = h.orchestrator.with_extractor(Arc::new(BrokenExtractor));
    h.provider.add_text_response("Chocolate cake it is.");

    let outcome = orchestrator
        .handle_turn("echo-kitchen", "my son loves chocolate cake", "session-extract")
        .await;

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.spoken_text, "Chocolate cake it is.");

    let messages = h
        .store
        .list_messages(outcome.conversation_id.unwrap())
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "Chocolate cake it is.");

    let user = h.store.get_user_by_identity("echo-kitchen").await.unwrap().unwrap();
    assert!(h.store.list_facts(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stalled_extraction_does_not_hang_turn() {
    let provider = Arc::new(MockProvider::new().with_stalled_completions());
    provider.add_text_response("Noted.");
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry);

    // default LLM extractor, so extraction goes through the stalled `complete`
    let orchestrator = Orchestrator::new(
        provider.clone(),
        Arc::new(registry),
        Arc::clone(&store),
        OrchestratorConfig::default().with_llm_timeout(Duration::from_millis(50)),
    );

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.handle_turn("echo-kitchen", "my son loves chocolate cake", "session-stall"),
    )
    .await
    .expect("turn should finish despite a stalled extraction call");

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.spoken_text, "Noted.");
    assert_eq!(provider.recorded_completions().len(), 1);
}

#[tokio::test]
async fn test_stalled_summary_still_closes_session() {
    let provider = Arc::new(MockProvider::new().with_stalled_completions());
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let orchestrator = Orchestrator::new(
        provider.clone(),
        Arc::new(ToolRegistry::new()),
        Arc::clone(&store),
        OrchestratorConfig::default()
            .with_llm_timeout(Duration::from_millis(50))
            .with_extraction(false),
    );
    provider.add_text_response("Added.");
    provider.add_text_response("Milk is on the list.");
    for utterance in ["add milk to the list", "what's on the list"] {
        orchestrator
            .handle_turn("echo-kitchen", utterance, "session-stall-sum")
            .await;
    }

    let closed = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.end_session("session-stall-sum"),
    )
    .await
    .expect("end_session should finish despite a stalled summary call")
    .unwrap()
    .unwrap();

    assert!(closed.is_closed());
    assert!(closed.summary.is_none());
}
