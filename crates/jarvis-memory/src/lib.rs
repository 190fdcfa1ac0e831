//! Jarvis Memory - durable household knowledge
//!
//! Typed storage for the eight persistent entities of the assistant:
//! users, facts, preferences, conversations, messages, orders, reminders
//! and grocery items.
//!
//! # Architecture
//!
//! ```text
//! jarvis-core ──► dyn MemoryStore ──► SqliteStore (sqlx, SQLite)
//! ```
//!
//! User-scoped rows reference `users(id)` with enforced foreign keys.
//! A conversation's `message_count` is always derived from its rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, OrderFilter, ReminderFilter};
pub use types::{
    Conversation, ConversationMessage, EmergencyContact, Fact, FactCategory, GroceryItem,
    Importance, MedicalInfo, Medicine, NewMessage, Order, OrderItem, OrderStatus, OrderType,
    Preference, PreferenceObservation, Priority, Reminder, ReminderCategory, RepeatPattern, Role,
    User, DEFAULT_DAILY_ORDER_LIMIT, DEFAULT_USER_NAME,
};
