use super::{parse_enum, parse_opt_ts, parse_ts, parse_uuid, ts, SqliteStore};
use crate::error::{Error, Result};
use crate::types::{Conversation, ConversationMessage, NewMessage};
use chrono::{Duration, Utc};
use jarvis_llm::MessageRole;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

// message_count is always read from the live row count.
const CONVERSATION_COLUMNS: &str = "c.id, c.user_id, c.session_id, c.started_at, c.ended_at,
     c.summary, c.platform,
     (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id) AS message_count";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, seq, role, content, tool_name, tool_call_id, created_at";

fn parse_role(s: &str) -> Option<MessageRole> {
    match s {
        "user" => Some(MessageRole::User),
        "assistant" => Some(MessageRole::Assistant),
        "tool" => Some(MessageRole::Tool),
        "system" => Some(MessageRole::System),
        _ => None,
    }
}

impl SqliteStore {
    // ── Conversations ───────────────────────────────────────────

    /// Insert a conversation.
    pub async fn create_conversation(&self, conversation: &Conversation) -> Result<()> {
        sqlx::query(
            "INSERT INTO conversations
             (id, user_id, session_id, started_at, ended_at, summary, message_count, platform)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.session_id)
        .bind(ts(&conversation.started_at))
        .bind(conversation.ended_at.as_ref().map(ts))
        .bind(&conversation.summary)
        .bind(&conversation.platform)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a conversation by ID.
    pub async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    /// The newest open conversation for an external session.
    pub async fn find_open_conversation(&self, session_id: &str) -> Result<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c
             WHERE c.session_id = ?1 AND c.ended_at IS NULL
             ORDER BY c.started_at DESC LIMIT 1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    /// Mark a conversation closed. Closing twice keeps the first end time.
    pub async fn close_conversation(&self, id: Uuid, summary: Option<&str>) -> Result<Conversation> {
        sqlx::query(
            "UPDATE conversations SET
                ended_at = COALESCE(ended_at, ?2),
                summary = COALESCE(?3, summary),
                message_count = (SELECT COUNT(*) FROM messages WHERE conversation_id = ?1)
             WHERE id = ?1",
        )
        .bind(id.to_string())
        .bind(ts(&Utc::now()))
        .bind(summary)
        .execute(&self.pool)
        .await?;

        self.get_conversation(id).await?.ok_or_else(|| Error::NotFound {
            entity: "conversation",
            id: id.to_string(),
        })
    }

    /// Summaries of the most recent closed conversations, newest first.
    pub async fn recent_summaries(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT summary FROM conversations
             WHERE user_id = ?1 AND summary IS NOT NULL AND summary <> ''
             ORDER BY started_at DESC LIMIT ?2",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| r.try_get::<String, _>("summary").map_err(Error::from))
            .collect()
    }

    pub(crate) fn row_to_conversation(row: &SqliteRow) -> Result<Conversation> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let started: String = row.try_get("started_at")?;

        Ok(Conversation {
            id: parse_uuid("conversations", &id)?,
            user_id: parse_uuid("conversations", &user_id)?,
            session_id: row.try_get("session_id")?,
            started_at: parse_ts("conversations", &started)?,
            ended_at: parse_opt_ts("conversations", row.try_get("ended_at")?)?,
            summary: row.try_get("summary")?,
            message_count: row.try_get("message_count")?,
            platform: row.try_get("platform")?,
        })
    }

    // ── Messages ────────────────────────────────────────────────

    /// Append a message.
    ///
    /// Runs in one transaction: assigns the next `seq`, forces `created_at`
    /// past the previous message, inserts, and rewrites `message_count`
    /// from the row count.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        message: &NewMessage,
    ) -> Result<ConversationMessage> {
        let conv_id = conversation_id.to_string();
        let mut tx = self.pool.begin().await?;

        let last = sqlx::query(
            "SELECT seq, created_at FROM messages
             WHERE conversation_id = ?1 ORDER BY seq DESC LIMIT 1",
        )
        .bind(&conv_id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut created_at = Utc::now();
        let mut seq = 1_i64;
        if let Some(row) = last {
            seq = row.try_get::<i64, _>("seq")? + 1;
            let prev = parse_ts("messages", &row.try_get::<String, _>("created_at")?)?;
            if created_at <= prev {
                created_at = prev + Duration::microseconds(1);
            }
        }

        let stored = ConversationMessage {
            id: Uuid::new_v4(),
            conversation_id,
            seq,
            role: message.role,
            content: message.content.clone(),
            tool_name: message.tool_name.clone(),
            tool_call_id: message.tool_call_id.clone(),
            created_at,
        };

        sqlx::query(
            "INSERT INTO messages
             (id, conversation_id, seq, role, content, tool_name, tool_call_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(stored.id.to_string())
        .bind(&conv_id)
        .bind(stored.seq)
        .bind(stored.role.as_str())
        .bind(&stored.content)
        .bind(&stored.tool_name)
        .bind(&stored.tool_call_id)
        .bind(ts(&stored.created_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET
                message_count = (SELECT COUNT(*) FROM messages WHERE conversation_id = ?1)
             WHERE id = ?1",
        )
        .bind(&conv_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    /// Full message log, oldest first.
    pub async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<ConversationMessage>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1 ORDER BY seq"
        ))
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// The last `limit` messages, oldest first.
    pub async fn recent_messages(
        &self,
        conversation_id: Uuid,
        limit: u32,
    ) -> Result<Vec<ConversationMessage>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ?1
                ORDER BY seq DESC LIMIT ?2
             ) ORDER BY seq"
        ))
        .bind(conversation_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_message).collect()
    }

    /// Number of stored messages.
    pub async fn count_messages(&self, conversation_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE conversation_id = ?1")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub(crate) fn row_to_message(row: &SqliteRow) -> Result<ConversationMessage> {
        let id: String = row.try_get("id")?;
        let conv: String = row.try_get("conversation_id")?;
        let role: String = row.try_get("role")?;
        let created: String = row.try_get("created_at")?;

        Ok(ConversationMessage {
            id: parse_uuid("messages", &id)?,
            conversation_id: parse_uuid("messages", &conv)?,
            seq: row.try_get("seq")?,
            role: parse_enum("messages", &role, parse_role)?,
            content: row.try_get("content")?,
            tool_name: row.try_get("tool_name")?,
            tool_call_id: row.try_get("tool_call_id")?,
            created_at: parse_ts("messages", &created)?,
        })
    }
}
