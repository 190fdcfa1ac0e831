//! SqliteStore - SQLite persistence for household memory.

use crate::error::{Error, Result};
use crate::store::{MemoryStore, OrderFilter, ReminderFilter};
use crate::types::{
    Conversation, ConversationMessage, Fact, GroceryItem, Importance, NewMessage, Order,
    OrderStatus, Preference, PreferenceObservation, Reminder, User,
};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

mod conversations;
mod household;
mod knowledge;
mod migrations;
mod orders;
mod users;


/// SQLite-backed memory store.
#[derive(Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store from a `sqlite:` URL.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(url = %url, "Memory store initialized");
        Ok(store)
    }

    /// Open (or create) a store at the given path.
    pub async fn from_path(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Internal(format!("mkdir: {e}")))?;
        }
        Self::connect(&format!("sqlite:{}", db_path.display()), 5).await
    }

    /// In-memory store (for tests).
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.run_migrations().await?;
        debug!("In-memory memory store initialized");
        Ok(store)
    }
}

// ── Column codecs ───────────────────────────────────────────────

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn opt_ts(dt: Option<&DateTime<Utc>>) -> Option<String> {
    dt.map(ts)
}

pub(crate) fn parse_ts(table: &'static str, s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRow {
            table,
            detail: format!("timestamp '{s}': {e}"),
        })
}

pub(crate) fn parse_opt_ts(table: &'static str, s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.map(|v| parse_ts(table, &v)).transpose()
}

pub(crate) fn parse_uuid(table: &'static str, s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::CorruptRow {
        table,
        detail: format!("uuid '{s}': {e}"),
    })
}

pub(crate) fn parse_opt_uuid(table: &'static str, s: Option<String>) -> Result<Option<Uuid>> {
    s.map(|v| parse_uuid(table, &v)).transpose()
}

pub(crate) fn parse_enum<T>(
    table: &'static str,
    s: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T> {
    parse(s).ok_or_else(|| Error::CorruptRow {
        table,
        detail: format!("unexpected value '{s}'"),
    })
}

#[async_trait]
impl MemoryStore for SqliteStore {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.get_user(id).await
    }

    async fn get_user_by_identity(&self, identity: &str) -> Result<Option<User>> {
        self.get_user_by_identity(identity).await
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        self.create_user(user).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.update_user(user).await
    }

    async fn touch_user(&self, id: Uuid, new_conversation: bool) -> Result<()> {
        self.touch_user(id, new_conversation).await
    }

    async fn list_approvers(&self) -> Result<Vec<User>> {
        self.list_approvers().await
    }

    async fn insert_fact(&self, fact: &Fact) -> Result<()> {
        self.insert_fact(fact).await
    }

    async fn list_facts(&self, user_id: Uuid) -> Result<Vec<Fact>> {
        self.list_facts(user_id).await
    }

    async fn increment_fact_reference(
        &self,
        fact_id: Uuid,
        raise_to: Option<Importance>,
    ) -> Result<Fact> {
        self.increment_fact_reference(fact_id, raise_to).await
    }

    async fn upsert_preference(&self, observation: &PreferenceObservation) -> Result<Preference> {
        self.upsert_preference(observation).await
    }

    async fn get_preference(
        &self,
        user_id: Uuid,
        category: &str,
        key: &str,
    ) -> Result<Option<Preference>> {
        self.get_preference(user_id, category, key).await
    }

    async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<Preference>> {
        self.list_preferences(user_id).await
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.create_conversation(conversation).await
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.get_conversation(id).await
    }

    async fn find_open_conversation(&self, session_id: &str) -> Result<Option<Conversation>> {
        self.find_open_conversation(session_id).await
    }

    async fn close_conversation(&self, id: Uuid, summary: Option<&str>) -> Result<Conversation> {
        self.close_conversation(id, summary).await
    }

    async fn recent_summaries(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>> {
        self.recent_summaries(user_id, limit).await
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        message: &NewMessage,
    ) -> Result<ConversationMessage> {
        self.append_message(conversation_id, message).await
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<ConversationMessage>> {
        self.list_messages(conversation_id).await
    }

    async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ConversationMessage>> {
        self.recent_messages(conversation_id, limit).await
    }

    async fn count_messages(&self, conversation_id: Uuid) -> Result<i64> {
        self.count_messages(conversation_id).await
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.insert_order(order).await
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        self.get_order(id).await
    }

    async fn update_order_if_status(&self, order: &Order, expected: OrderStatus) -> Result<bool> {
        self.update_order_if_status(order, expected).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        self.list_orders(filter).await
    }

    async fn approved_spend_since(&self, requested_by: Uuid, since: DateTime<Utc>) -> Result<f64> {
        self.approved_spend_since(requested_by, since).await
    }

    async fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.insert_reminder(reminder).await
    }

    async fn list_reminders(
        &self,
        user_id: Uuid,
        filter: &ReminderFilter,
    ) -> Result<Vec<Reminder>> {
        self.list_reminders(user_id, filter).await
    }

    async fn add_grocery_item(&self, item: &GroceryItem) -> Result<GroceryItem> {
        self.add_grocery_item(item).await
    }

    async fn list_grocery_items(
        &self,
        user_id: Uuid,
        include_purchased: bool,
    ) -> Result<Vec<GroceryItem>> {
        self.list_grocery_items(user_id, include_purchased).await
    }

    async fn mark_grocery_purchased(&self, user_id: Uuid, name: &str) -> Result<u64> {
        self.mark_grocery_purchased(user_id, name).await
    }
}
