//! Session Manager - Voice session to conversation mapping
//!
//! A voice session id maps to exactly one open [`Conversation`]. A session
//! id that was never seen, or whose conversation was closed, always starts
//! a fresh conversation; conversations are never resumed.
//!
//! Short-term memory is the conversation's message log viewed through a
//! window of the most recent messages. The window is a read-time view and
//! never deletes rows.

use crate::error::{Error, Result};
use jarvis_llm::{Message, MessageRole};
use jarvis_memory::{
    Conversation, ConversationMessage, MemoryStore, NewMessage, Role, User, DEFAULT_USER_NAME,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Configuration for the session manager
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Messages kept in the LLM context window
    pub history_window: u32,
    /// Platform recorded on new conversations
    pub platform: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            platform: "alexa".to_string(),
        }
    }
}

impl SessionConfig {
    /// Set the history window
    #[must_use]
    pub fn with_history_window(mut self, window: u32) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Set the platform name
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

/// A resolved user together with their open conversation
#[derive(Debug, Clone)]
pub struct Session {
    /// Speaker
    pub user: User,
    /// Open conversation for the session id
    pub conversation: Conversation,
    /// Whether the conversation was created by this call
    pub started: bool,
}

/// Maps voice sessions to conversations
pub struct SessionManager {
    store: Arc<dyn MemoryStore>,
    config: SessionConfig,
}

impl SessionManager {
    /// Create a new session manager
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Look up a user by external identity, creating one with default
    /// settings on first contact.
    #[instrument(skip(self))]
    pub async fn resolve_user(&self, user_identity: &str) -> Result<User> {
        if let Some(user) = self.store.get_user_by_identity(user_identity).await? {
            return Ok(user);
        }

        let user = User::new(user_identity, DEFAULT_USER_NAME, Role::Adult);
        match self.store.create_user(&user).await {
            Ok(()) => {
                info!(user_id = %user.id, "Created user on first contact");
                Ok(user)
            }
            // Lost a race with a concurrent first contact
            Err(e) if e.is_constraint_violation() => self
                .store
                .get_user_by_identity(user_identity)
                .await?
                .ok_or(Error::Store(e)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the user and the open conversation for `session_id`.
    #[instrument(skip(self))]
    pub async fn get_or_create_conversation(
        &self,
        session_id: &str,
        user_identity: &str,
    ) -> Result<Session> {
        let user = self.resolve_user(user_identity).await?;

        if let Some(conversation) = self.store.find_open_conversation(session_id).await? {
            if conversation.user_id == user.id {
                debug!(conversation_id = %conversation.id, "Continuing conversation");
                return Ok(Session {
                    user,
                    conversation,
                    started: false,
                });
            }
            warn!(
                conversation_id = %conversation.id,
                "Session id already belongs to another user"
            );
            return Err(Error::Authorization(format!(
                "session '{session_id}' belongs to another user"
            )));
        }

        let conversation = Conversation::new(user.id, session_id, &self.config.platform);
        self.store.create_conversation(&conversation).await?;
        self.store.touch_user(user.id, false).await?;
        info!(conversation_id = %conversation.id, user_id = %user.id, "Started conversation");

        Ok(Session {
            user,
            conversation,
            started: true,
        })
    }

    /// The open conversation for `session_id`, if any
    pub async fn find_open(&self, session_id: &str) -> Result<Option<Conversation>> {
        Ok(self.store.find_open_conversation(session_id).await?)
    }

    /// Append a message to the durable log
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        message: NewMessage,
    ) -> Result<ConversationMessage> {
        let stored = self.store.append_message(conversation_id, &message).await?;
        debug!(
            conversation_id = %conversation_id,
            seq = stored.seq,
            role = %stored.role.as_str(),
            "Message appended"
        );
        Ok(stored)
    }

    /// The most recent conversational messages, oldest first.
    ///
    /// Tool rows never count against `history_window`.
    pub async fn recent_history(&self, conversation_id: Uuid) -> Result<Vec<ConversationMessage>> {
        let mut history: Vec<ConversationMessage> = self
            .store
            .list_messages(conversation_id)
            .await?
            .into_iter()
            .filter(|m| m.role != MessageRole::Tool)
            .collect();
        let window = self.config.history_window as usize;
        if history.len() > window {
            history.drain(..history.len() - window);
        }
        Ok(history)
    }

    /// The full message log, oldest first
    pub async fn transcript(&self, conversation_id: Uuid) -> Result<Vec<ConversationMessage>> {
        Ok(self.store.list_messages(conversation_id).await?)
    }

    /// Close the conversation and record its summary
    #[instrument(skip(self, summary))]
    pub async fn close(&self, conversation_id: Uuid, summary: Option<&str>) -> Result<Conversation> {
        let conversation = self.store.close_conversation(conversation_id, summary).await?;
        info!(
            message_count = conversation.message_count,
            summarized = summary.is_some(),
            "Conversation closed"
        );
        Ok(conversation)
    }
}

/// Convert the stored window into LLM messages.
///
/// Tool results from earlier turns are left out: the assistant requests
/// they answer are not part of the durable log, and providers reject tool
/// messages without a matching request.
#[must_use]
pub fn history_to_messages(history: &[ConversationMessage]) -> Vec<Message> {
    history
        .iter()
        .filter_map(|m| match m.role {
            MessageRole::User => Some(Message::user(&m.content)),
            MessageRole::Assistant => Some(Message::assistant(&m.content)),
            MessageRole::System => Some(Message::system(&m.content)),
            MessageRole::Tool => None,
        })
        .collect()
}

/// Render the user/assistant exchange as plain text
#[must_use]
pub fn render_transcript(messages: &[ConversationMessage]) -> String {
    messages
        .iter()
        .filter_map(|m| match m.role {
            MessageRole::User => Some(format!("User: {}", m.content)),
            MessageRole::Assistant => Some(format!("Assistant: {}", m.content)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests;
