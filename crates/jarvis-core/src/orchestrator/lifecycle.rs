//! Session start and end
//!
//! Greeting a caller and closing a finished session with its summary.

use crate::error::Result;
use crate::extractor::Transcript;
use jarvis_memory::Conversation;
use tracing::{info, instrument, warn};

use super::core::Orchestrator;

/// Greeting when the caller is not known yet
pub const WELCOME_GREETING: &str = "Hi! I'm Jarvis, your home assistant. How can I help you today?";

impl Orchestrator {
    /// Greeting for the start of a session
    #[instrument(skip(self))]
    pub async fn greeting(&self, user_identity: &str) -> Result<String> {
        let Some(user) = self.store.get_user_by_identity(user_identity).await? else {
            return Ok(WELCOME_GREETING.to_string());
        };

        let returning = user.total_conversations > 0
            || !self.store.recent_summaries(user.id, 1).await?.is_empty();
        Ok(if returning {
            format!("Hi {}! Good to talk to you again. How can I help?", user.name)
        } else {
            format!("Hi {}! How can I help you today?", user.name)
        })
    }

    /// Close the open conversation for `session_id`.
    ///
    /// Sessions long enough get an LLM summary first; a failed summary is
    /// logged and the conversation closes without one. Returns `None` when
    /// no conversation is open for the session.
    #[instrument(skip(self))]
    pub async fn end_session(&self, session_id: &str) -> Result<Option<Conversation>> {
        let Some(conversation) = self.sessions.find_open(session_id).await? else {
            return Ok(None);
        };

        let messages = self.sessions.transcript(conversation.id).await?;
        let summary = if (messages.len() as i64) >= self.config.summary_min_messages {
            let transcript =
                Transcript::from_messages(conversation.user_id, conversation.id, &messages);
            match self.summarizer.summarize(&transcript).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!(conversation_id = %conversation.id, error = %e, "Session summary failed");
                    None
                }
            }
        } else {
            None
        };

        let closed = self.sessions.close(conversation.id, summary.as_deref()).await?;
        self.store.touch_user(conversation.user_id, true).await?;
        info!(
            conversation_id = %closed.id,
            messages = closed.message_count,
            "Session ended"
        );
        Ok(Some(closed))
    }
}
