//! Domain entities persisted by the memory store.
//!
//! Every user-scoped entity carries the owning `user_id`; the store
//! enforces that it references an existing [`User`].

use chrono::{DateTime, Utc};
use jarvis_llm::MessageRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Users ───────────────────────────────────────────────────────

/// Household role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Adult family member
    Adult,
    /// Child
    Child,
    /// Elderly family member
    Elderly,
    /// Domestic help
    Maid,
    /// Visitor
    Guest,
}

impl Role {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Child => "child",
            Self::Elderly => "elderly",
            Self::Maid => "maid",
            Self::Guest => "guest",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "adult" => Some(Self::Adult),
            "child" => Some(Self::Child),
            "elderly" => Some(Self::Elderly),
            "maid" => Some(Self::Maid),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Medication on a user's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    /// Medicine name
    pub name: String,
    /// Dosage (free text, e.g. "500mg")
    #[serde(default)]
    pub dosage: Option<String>,
    /// Schedule (free text, e.g. "after breakfast")
    #[serde(default)]
    pub schedule: Option<String>,
}

/// Someone to call in an emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name
    pub name: String,
    /// Phone number
    pub phone: String,
    /// Relation to the user
    #[serde(default)]
    pub relation: Option<String>,
}

/// Medical information blob stored alongside the user profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalInfo {
    /// Current medicines
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    /// Known allergies
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Chronic conditions
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Emergency contacts
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    /// Doctor's name and phone, free text
    #[serde(default)]
    pub doctor: Option<String>,
}

/// A household member known to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Internal ID
    pub id: Uuid,
    /// Stable external identity supplied by the voice adapter
    pub identity: String,
    /// Display name
    pub name: String,
    /// Household role
    pub role: Role,
    /// Age in years, if known
    pub age: Option<u32>,
    /// Preferred response language (BCP-47 tag)
    pub language: String,
    /// Preferred response length ("short" or "detailed")
    pub response_length: String,
    /// Maximum approved spend per day
    pub daily_order_limit: f64,
    /// Whether every order needs an approver
    pub requires_approval: bool,
    /// Whether this user may approve other people's orders
    pub can_approve_orders: bool,
    /// Optional medical profile
    pub medical_info: Option<MedicalInfo>,
    /// Number of completed conversations
    pub total_conversations: i64,
    /// Last time the user spoke to the assistant
    pub last_interaction: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

/// Display name given to users the adapter could not name.
pub const DEFAULT_USER_NAME: &str = "Friend";

/// Daily order limit for new users.
pub const DEFAULT_DAILY_ORDER_LIMIT: f64 = 500.0;

impl User {
    /// New user with role-dependent defaults.
    ///
    /// Adults may approve orders and order without approval; every other
    /// role needs approval and cannot approve.
    #[must_use]
    pub fn new(identity: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        let adult = role == Role::Adult;
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            name: name.into(),
            role,
            age: None,
            language: "en".to_string(),
            response_length: "short".to_string(),
            daily_order_limit: DEFAULT_DAILY_ORDER_LIMIT,
            requires_approval: !adult,
            can_approve_orders: adult,
            medical_info: None,
            total_conversations: 0,
            last_interaction: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the daily order limit
    #[must_use]
    pub fn with_daily_order_limit(mut self, limit: f64) -> Self {
        self.daily_order_limit = limit;
        self
    }

    /// Set whether orders need approval
    #[must_use]
    pub fn with_requires_approval(mut self, requires: bool) -> Self {
        self.requires_approval = requires;
        self
    }

    /// Set whether this user can approve orders
    #[must_use]
    pub fn with_can_approve_orders(mut self, can_approve: bool) -> Self {
        self.can_approve_orders = can_approve;
        self
    }

    /// Set the age
    #[must_use]
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Attach a medical profile
    #[must_use]
    pub fn with_medical_info(mut self, info: MedicalInfo) -> Self {
        self.medical_info = Some(info);
        self
    }
}

// ── Facts & preferences ─────────────────────────────────────────

/// How much a fact matters. Ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Trivia
    Low,
    /// Default
    Normal,
    /// Worth surfacing often
    High,
    /// Safety relevant (allergies, medication)
    Critical,
}

impl Importance {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "normal" | "medium" => Some(Self::Normal),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactCategory {
    /// Food and drink
    Food,
    /// Health, allergies, medication
    Health,
    /// Routines
    Habit,
    /// Likes and dislikes
    Preference,
    /// Family members and relationships
    Family,
    /// Work and school
    Work,
    /// Anything else
    Other,
}

impl FactCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Health => "health",
            Self::Habit => "habit",
            Self::Preference => "preference",
            Self::Family => "family",
            Self::Work => "work",
            Self::Other => "other",
        }
    }

    /// Parse a category name, mapping unknown names to `Other`
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "food" => Self::Food,
            "health" | "medical" => Self::Health,
            "habit" | "routine" => Self::Habit,
            "preference" | "preferences" => Self::Preference,
            "family" => Self::Family,
            "work" | "school" => Self::Work,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for FactCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable piece of knowledge about a user.
///
/// Text is never rewritten once stored; recurrence only moves
/// `reference_count`, `last_referenced` and (upwards) `importance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Fact ID
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// The fact itself ("son loves chocolate cake")
    pub text: String,
    /// Topic
    pub category: FactCategory,
    /// Importance
    pub importance: Importance,
    /// Conversation the fact was first learned in
    pub source_conversation_id: Option<Uuid>,
    /// How many times the fact has been observed
    pub reference_count: i64,
    /// First observation
    pub created_at: DateTime<Utc>,
    /// Latest observation
    pub last_referenced: DateTime<Utc>,
}

impl Fact {
    /// New fact observed once, now
    #[must_use]
    pub fn new(
        user_id: Uuid,
        text: impl Into<String>,
        category: FactCategory,
        importance: Importance,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            text: text.into(),
            category,
            importance,
            source_conversation_id: None,
            reference_count: 1,
            created_at: now,
            last_referenced: now,
        }
    }

    /// Record the conversation the fact came from
    #[must_use]
    pub fn with_source(mut self, conversation_id: Option<Uuid>) -> Self {
        self.source_conversation_id = conversation_id;
        self
    }
}

/// A keyed, overwritable user setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    /// Preference ID
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Grouping ("food", "music", ...)
    pub category: String,
    /// Key within the category ("spice_level")
    pub key: String,
    /// Current value
    pub value: String,
    /// Confidence in `value`, 0.0 ..= 1.0
    pub confidence: f64,
    /// Conversation of the latest observation
    pub source_conversation_id: Option<Uuid>,
    /// First observation
    pub created_at: DateTime<Utc>,
    /// Last time the value changed
    pub updated_at: DateTime<Utc>,
}

/// A single observation of a preference, as fed to
/// [`MemoryStore::upsert_preference`](crate::MemoryStore::upsert_preference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceObservation {
    /// Owner
    pub user_id: Uuid,
    /// Grouping
    pub category: String,
    /// Key within the category
    pub key: String,
    /// Observed value
    pub value: String,
    /// Confidence of this observation
    pub confidence: f64,
    /// Conversation the observation came from
    pub source_conversation_id: Option<Uuid>,
}

// ── Conversations ───────────────────────────────────────────────

/// One voice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID
    pub id: Uuid,
    /// Speaker
    pub user_id: Uuid,
    /// External session identifier from the voice runtime
    pub session_id: String,
    /// Session start
    pub started_at: DateTime<Utc>,
    /// Session end, once closed
    pub ended_at: Option<DateTime<Utc>>,
    /// One-line summary written when the session closes
    pub summary: Option<String>,
    /// Number of stored messages (always the live row count)
    pub message_count: i64,
    /// Voice platform name
    pub platform: String,
}

impl Conversation {
    /// New open conversation
    #[must_use]
    pub fn new(user_id: Uuid, session_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            session_id: session_id.into(),
            started_at: Utc::now(),
            ended_at: None,
            summary: None,
            message_count: 0,
            platform: platform.into(),
        }
    }

    /// Whether the session has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// An entry in a conversation's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Message ID
    pub id: Uuid,
    /// Owning conversation
    pub conversation_id: Uuid,
    /// 1-based position in the conversation
    pub seq: i64,
    /// Author
    pub role: MessageRole,
    /// Text or JSON payload
    pub content: String,
    /// Tool name for tool messages
    pub tool_name: Option<String>,
    /// Tool call ID linking tool results to the assistant request
    pub tool_call_id: Option<String>,
    /// Creation time, strictly increasing within a conversation
    pub created_at: DateTime<Utc>,
}

/// A message to append; `seq` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Author
    pub role: MessageRole,
    /// Text or JSON payload
    pub content: String,
    /// Tool name for tool messages
    pub tool_name: Option<String>,
    /// Tool call ID
    pub tool_call_id: Option<String>,
}

impl NewMessage {
    /// A user utterance
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    /// An assistant reply
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    /// A system note
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    /// A tool result
    #[must_use]
    pub fn tool(
        tool_name: impl Into<String>,
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_name: Some(tool_name.into()),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }
}

// ── Orders ──────────────────────────────────────────────────────

/// Kind of purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Groceries
    Grocery,
    /// Pharmacy
    Medicine,
    /// Anything else
    Other,
}

impl OrderType {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grocery => "grocery",
            Self::Medicine => "medicine",
            Self::Other => "other",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "grocery" => Some(Self::Grocery),
            "medicine" => Some(Self::Medicine),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting approval
    Pending,
    /// Approved, awaiting placement
    Approved,
    /// Rejected by an approver
    Rejected,
    /// Placed with the fulfillment platform
    Ordered,
    /// Delivered
    Delivered,
    /// Cancelled by the requester
    Cancelled,
}

impl OrderStatus {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Ordered => "ordered",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "ordered" => Some(Self::Ordered),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// No further transitions are possible from this state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Delivered | Self::Cancelled)
    }

    /// Counts against the requester's daily spend
    #[must_use]
    pub fn counts_toward_spend(&self) -> bool {
        matches!(self, Self::Approved | Self::Ordered | Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Item name
    pub name: String,
    /// Quantity
    pub quantity: f64,
    /// Unit ("kg", "packet")
    #[serde(default)]
    pub unit: Option<String>,
    /// Estimated unit price
    #[serde(default)]
    pub estimated_price: f64,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderItem {
    /// Estimated line total
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.estimated_price * self.quantity
    }
}

/// A purchase request and its approval history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: Uuid,
    /// User the order is for
    pub user_id: Uuid,
    /// User who asked for it
    pub requested_by: Uuid,
    /// User who approved or rejected it
    pub approved_by: Option<Uuid>,
    /// Kind of purchase
    pub order_type: OrderType,
    /// Line items
    pub items: Vec<OrderItem>,
    /// Estimated total
    pub total_amount: f64,
    /// Preferred fulfillment platform
    pub platform: Option<String>,
    /// Current state
    pub status: OrderStatus,
    /// Reason given on rejection
    pub rejection_reason: Option<String>,
    /// Platform order reference once placed
    pub external_order_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of approval
    pub approved_at: Option<DateTime<Utc>>,
    /// Time of rejection
    pub rejected_at: Option<DateTime<Utc>>,
    /// Time of placement
    pub ordered_at: Option<DateTime<Utc>>,
    /// Time of delivery
    pub delivered_at: Option<DateTime<Utc>>,
    /// Time of cancellation
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// New pending order; the total is computed from the items
    #[must_use]
    pub fn new(
        user_id: Uuid,
        requested_by: Uuid,
        order_type: OrderType,
        items: Vec<OrderItem>,
    ) -> Self {
        let total_amount = items.iter().map(OrderItem::line_total).sum();
        Self {
            id: Uuid::new_v4(),
            user_id,
            requested_by,
            approved_by: None,
            order_type,
            items,
            total_amount,
            platform: None,
            status: OrderStatus::Pending,
            rejection_reason: None,
            external_order_id: None,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
            ordered_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    /// Set the preferred platform
    #[must_use]
    pub fn with_platform(mut self, platform: Option<String>) -> Self {
        self.platform = platform;
        self
    }

    /// Comma-separated item names, for speech
    #[must_use]
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ── Reminders ───────────────────────────────────────────────────

/// Repeat pattern of a reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPattern {
    /// One-shot
    #[default]
    None,
    /// Every day
    Daily,
    /// Every week
    Weekly,
}

impl RepeatPattern {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// Reminder topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderCategory {
    /// Take medicine
    Medicine,
    /// Chore or errand
    Task,
    /// Appointment or occasion
    Event,
    /// Anything else
    #[default]
    Other,
}

impl ReminderCategory {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medicine => "medicine",
            Self::Task => "task",
            Self::Event => "event",
            Self::Other => "other",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "medicine" => Some(Self::Medicine),
            "task" => Some(Self::Task),
            "event" => Some(Self::Event),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Reminder urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low
    Low,
    /// Normal
    #[default]
    Normal,
    /// High
    High,
}

impl Priority {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Parse the stored representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A scheduled reminder. Triggering is handled outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Reminder ID
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// What to say
    pub message: String,
    /// When to say it
    pub remind_at: DateTime<Utc>,
    /// Repeat pattern
    pub repeat: RepeatPattern,
    /// Stop repeating after this time
    pub repeat_until: Option<DateTime<Utc>>,
    /// Still scheduled
    pub active: bool,
    /// Last time the scheduler fired it
    pub last_triggered: Option<DateTime<Utc>>,
    /// Times fired
    pub trigger_count: i64,
    /// Topic
    pub category: ReminderCategory,
    /// Urgency
    pub priority: Priority,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// New active one-shot reminder
    #[must_use]
    pub fn new(user_id: Uuid, message: impl Into<String>, remind_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            message: message.into(),
            remind_at,
            repeat: RepeatPattern::None,
            repeat_until: None,
            active: true,
            last_triggered: None,
            trigger_count: 0,
            category: ReminderCategory::Other,
            priority: Priority::Normal,
            created_at: Utc::now(),
        }
    }

    /// Set the repeat pattern
    #[must_use]
    pub fn with_repeat(mut self, repeat: RepeatPattern) -> Self {
        self.repeat = repeat;
        self
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: ReminderCategory) -> Self {
        self.category = category;
        self
    }
}

// ── Grocery list ────────────────────────────────────────────────

/// An entry on the household grocery list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    /// Item ID
    pub id: Uuid,
    /// List owner
    pub user_id: Uuid,
    /// Item name
    pub name: String,
    /// Quantity
    pub quantity: f64,
    /// Unit
    pub unit: Option<String>,
    /// Aisle / category
    pub category: Option<String>,
    /// Who added it
    pub added_by: Option<Uuid>,
    /// Bought already
    pub purchased: bool,
    /// Free-text notes
    pub notes: Option<String>,
    /// When it was added
    pub created_at: DateTime<Utc>,
    /// When it was bought
    pub purchased_at: Option<DateTime<Utc>>,
}

impl GroceryItem {
    /// New unpurchased item
    #[must_use]
    pub fn new(user_id: Uuid, name: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            quantity,
            unit: None,
            category: None,
            added_by: None,
            purchased: false,
            notes: None,
            created_at: Utc::now(),
            purchased_at: None,
        }
    }
}
