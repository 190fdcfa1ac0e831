use super::SqliteStore;
use crate::error::Result;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id                  TEXT PRIMARY KEY,
        identity            TEXT NOT NULL UNIQUE,
        name                TEXT NOT NULL,
        role                TEXT NOT NULL DEFAULT 'adult'
                            CHECK (role IN ('adult', 'child', 'elderly', 'maid', 'guest')),
        age                 INTEGER,
        language            TEXT NOT NULL DEFAULT 'en',
        response_length     TEXT NOT NULL DEFAULT 'short',
        daily_order_limit   REAL NOT NULL DEFAULT 500.0,
        requires_approval   INTEGER NOT NULL DEFAULT 0,
        can_approve_orders  INTEGER NOT NULL DEFAULT 0,
        medical_info        TEXT,
        total_conversations INTEGER NOT NULL DEFAULT 0,
        last_interaction    TEXT,
        created_at          TEXT NOT NULL,
        updated_at          TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS facts (
        id                     TEXT PRIMARY KEY,
        user_id                TEXT NOT NULL REFERENCES users(id),
        text                   TEXT NOT NULL,
        category               TEXT NOT NULL DEFAULT 'other'
                               CHECK (category IN ('food', 'health', 'habit', 'preference',
                                                   'family', 'work', 'other')),
        importance             TEXT NOT NULL DEFAULT 'normal'
                               CHECK (importance IN ('low', 'normal', 'high', 'critical')),
        source_conversation_id TEXT REFERENCES conversations(id),
        reference_count        INTEGER NOT NULL DEFAULT 1,
        created_at             TEXT NOT NULL,
        last_referenced        TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_facts_user ON facts(user_id, last_referenced)",
    "CREATE TABLE IF NOT EXISTS preferences (
        id                     TEXT PRIMARY KEY,
        user_id                TEXT NOT NULL REFERENCES users(id),
        category               TEXT NOT NULL,
        key                    TEXT NOT NULL,
        value                  TEXT NOT NULL,
        confidence             REAL NOT NULL DEFAULT 0.5,
        source_conversation_id TEXT REFERENCES conversations(id),
        created_at             TEXT NOT NULL,
        updated_at             TEXT NOT NULL,
        UNIQUE (user_id, category, key)
    )",
    "CREATE TABLE IF NOT EXISTS conversations (
        id            TEXT PRIMARY KEY,
        user_id       TEXT NOT NULL REFERENCES users(id),
        session_id    TEXT NOT NULL,
        started_at    TEXT NOT NULL,
        ended_at      TEXT,
        summary       TEXT,
        message_count INTEGER NOT NULL DEFAULT 0,
        platform      TEXT NOT NULL DEFAULT 'voice'
    )",
    "CREATE INDEX IF NOT EXISTS idx_conversations_session ON conversations(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id, started_at)",
    "CREATE TABLE IF NOT EXISTS messages (
        id              TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversations(id),
        seq             INTEGER NOT NULL,
        role            TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'tool', 'system')),
        content         TEXT NOT NULL,
        tool_name       TEXT,
        tool_call_id    TEXT,
        created_at      TEXT NOT NULL,
        UNIQUE (conversation_id, seq)
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id                TEXT PRIMARY KEY,
        user_id           TEXT NOT NULL REFERENCES users(id),
        requested_by      TEXT NOT NULL REFERENCES users(id),
        approved_by       TEXT REFERENCES users(id),
        order_type        TEXT NOT NULL CHECK (order_type IN ('grocery', 'medicine', 'other')),
        items             TEXT NOT NULL,
        total_amount      REAL NOT NULL DEFAULT 0,
        platform          TEXT,
        status            TEXT NOT NULL DEFAULT 'pending'
                          CHECK (status IN ('pending', 'approved', 'rejected', 'ordered',
                                            'delivered', 'cancelled')),
        rejection_reason  TEXT,
        external_order_id TEXT,
        created_at        TEXT NOT NULL,
        approved_at       TEXT,
        rejected_at       TEXT,
        ordered_at        TEXT,
        delivered_at      TEXT,
        cancelled_at      TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_orders_requester ON orders(requested_by, approved_at)",
    "CREATE TABLE IF NOT EXISTS reminders (
        id             TEXT PRIMARY KEY,
        user_id        TEXT NOT NULL REFERENCES users(id),
        message        TEXT NOT NULL,
        remind_at      TEXT NOT NULL,
        repeat_pattern TEXT NOT NULL DEFAULT 'none'
                       CHECK (repeat_pattern IN ('none', 'daily', 'weekly')),
        repeat_until   TEXT,
        active         INTEGER NOT NULL DEFAULT 1,
        last_triggered TEXT,
        trigger_count  INTEGER NOT NULL DEFAULT 0,
        category       TEXT NOT NULL DEFAULT 'other'
                       CHECK (category IN ('medicine', 'task', 'event', 'other')),
        priority       TEXT NOT NULL DEFAULT 'normal'
                       CHECK (priority IN ('low', 'normal', 'high')),
        created_at     TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders(user_id, active, remind_at)",
    "CREATE TABLE IF NOT EXISTS grocery_list (
        id           TEXT PRIMARY KEY,
        user_id      TEXT NOT NULL REFERENCES users(id),
        name         TEXT NOT NULL,
        quantity     REAL NOT NULL DEFAULT 1,
        unit         TEXT,
        category     TEXT,
        added_by     TEXT REFERENCES users(id),
        purchased    INTEGER NOT NULL DEFAULT 0,
        notes        TEXT,
        created_at   TEXT NOT NULL,
        purchased_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_grocery_user ON grocery_list(user_id, purchased)",
];

impl SqliteStore {
    // ── Migrations ──────────────────────────────────────────────

    pub(crate) async fn run_migrations(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}
