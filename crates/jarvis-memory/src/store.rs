//! Storage abstraction
//!
//! [`MemoryStore`] is the only shared resource between turns. Besides plain
//! CRUD it offers the three atomic operations the core relies on:
//! preference upsert, fact reference increment, and compare-and-set on
//! order status.

use crate::error::Result;
use crate::types::{
    Conversation, ConversationMessage, Fact, GroceryItem, Importance, NewMessage, Order,
    OrderStatus, Preference, PreferenceObservation, Reminder, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Filter for [`MemoryStore::list_orders`]
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Orders for this user
    pub user_id: Option<Uuid>,
    /// Orders requested by this user
    pub requested_by: Option<Uuid>,
    /// Orders in this state
    pub status: Option<OrderStatus>,
    /// Maximum rows, newest first
    pub limit: Option<u32>,
}

impl OrderFilter {
    /// Orders in the given state
    #[must_use]
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Filter for [`MemoryStore::list_reminders`]
#[derive(Debug, Clone, Default)]
pub struct ReminderFilter {
    /// Only active reminders
    pub active_only: bool,
    /// Due at or after
    pub from: Option<DateTime<Utc>>,
    /// Due at or before
    pub until: Option<DateTime<Utc>>,
}

/// Persistent storage for all household entities
#[async_trait]
pub trait MemoryStore: Send + Sync {
    // Users

    /// Look up a user by internal ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Look up a user by external identity
    async fn get_user_by_identity(&self, identity: &str) -> Result<Option<User>>;

    /// Insert a new user
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Overwrite a user's profile fields
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Record an interaction; bumps `total_conversations` when `new_conversation` is set
    async fn touch_user(&self, id: Uuid, new_conversation: bool) -> Result<()>;

    /// Users allowed to approve orders
    async fn list_approvers(&self) -> Result<Vec<User>>;

    // Facts

    /// Insert a fact
    async fn insert_fact(&self, fact: &Fact) -> Result<()>;

    /// Facts for a user, most recently referenced first
    async fn list_facts(&self, user_id: Uuid) -> Result<Vec<Fact>>;

    /// Atomically add one reference and optionally raise importance
    async fn increment_fact_reference(
        &self,
        fact_id: Uuid,
        raise_to: Option<Importance>,
    ) -> Result<Fact>;

    // Preferences

    /// Atomically merge an observation into the (user, category, key) row.
    ///
    /// The value is last-write-wins. Confidence becomes
    /// `max(stored, observed)`. `updated_at` only advances when the value
    /// actually changed.
    async fn upsert_preference(&self, observation: &PreferenceObservation) -> Result<Preference>;

    /// Look up one preference
    async fn get_preference(
        &self,
        user_id: Uuid,
        category: &str,
        key: &str,
    ) -> Result<Option<Preference>>;

    /// All preferences for a user, ordered by category then key
    async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<Preference>>;

    // Conversations

    /// Insert a conversation
    async fn create_conversation(&self, conversation: &Conversation) -> Result<()>;

    /// Look up a conversation
    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// The open conversation for an external session, if any
    async fn find_open_conversation(&self, session_id: &str) -> Result<Option<Conversation>>;

    /// Close a conversation with an optional summary
    async fn close_conversation(&self, id: Uuid, summary: Option<&str>) -> Result<Conversation>;

    /// Summaries of the user's most recent closed conversations
    async fn recent_summaries(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>>;

    // Messages

    /// Append to the conversation log and refresh `message_count`
    async fn append_message(
        &self,
        conversation_id: Uuid,
        message: &NewMessage,
    ) -> Result<ConversationMessage>;

    /// Full log, oldest first
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<ConversationMessage>>;

    /// The most recent `limit` messages, oldest first
    async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ConversationMessage>>;

    /// Number of stored messages
    async fn count_messages(&self, conversation_id: Uuid) -> Result<i64>;

    // Orders

    /// Insert an order
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Look up an order
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// Persist `order` only if the stored status still equals `expected`.
    ///
    /// Returns `false` when another writer got there first.
    async fn update_order_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool>;

    /// Orders matching a filter, newest first
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Sum of approved (or later) orders requested by a user since `since`
    async fn approved_spend_since(&self, requested_by: Uuid, since: DateTime<Utc>) -> Result<f64>;

    // Reminders

    /// Insert a reminder
    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()>;

    /// Reminders for a user, soonest first
    async fn list_reminders(&self, user_id: Uuid, filter: &ReminderFilter)
        -> Result<Vec<Reminder>>;

    // Grocery list

    /// Add an item, merging quantity into an unpurchased item with the same name
    async fn add_grocery_item(&self, item: &GroceryItem) -> Result<GroceryItem>;

    /// Items on the list
    async fn list_grocery_items(
        &self,
        user_id: Uuid,
        include_purchased: bool,
    ) -> Result<Vec<GroceryItem>>;

    /// Mark unpurchased items with this name as bought; returns how many changed
    async fn mark_grocery_purchased(&self, user_id: Uuid, name: &str) -> Result<u64>;
}
