//! Orchestrator main execution loop
//!
//! One call to [`Orchestrator::process`] handles one utterance:
//!
//! ```text
//! resolve session ─► append user message ─► build prompt
//!        ┌──────────────────────────────────────┘
//!        ▼
//!   LLM call ──tool calls──► run tools, append tool messages ──► next round
//!        │                                        (at most max_tool_rounds)
//!        └─final text──► append assistant message ─► extract facts ─► reply
//! ```

use crate::error::{Error, UserFriendlyError, DEGRADED_REPLY, FALLBACK_APOLOGY};
use crate::extractor::{relevant_facts, Transcript};
use crate::session_manager::{history_to_messages, Session};
use crate::utils::{is_farewell, retry_with_backoff, truncate_for_voice};
use chrono::{Local, Utc};
use jarvis_llm::{CompletionRequest, Message, ToolCompletionRequest, ToolCompletionResponse};
use jarvis_memory::NewMessage;
use jarvis_tools::{OrderGate, ToolContext};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::config::TurnInput;
use super::core::Orchestrator;
use super::prompt::{build_system_prompt, PromptContext};
use super::types::{ToolCallRecord, TurnOutcome, TurnStatus};

/// Spoken when the LLM returns neither text nor tool calls
pub const EMPTY_REPLY: &str = "I'm not sure how to respond to that.";

/// Spoken before the session closes on "stop" or "goodbye"
pub const FAREWELL_REPLY: &str = "Goodbye! Talk to you soon.";

impl Orchestrator {
    /// Handle one utterance and return what to say back.
    ///
    /// Never fails: every error path ends in a spoken fallback.
    pub async fn handle_turn(
        &self,
        user_identity: &str,
        utterance: &str,
        session_id: &str,
    ) -> TurnOutcome {
        self.process(TurnInput::new(session_id, user_identity, utterance))
            .await
    }

    /// Process an input and return the outcome
    #[instrument(skip(self, input), fields(
        session_id = %input.session_id,
        user = %input.user_identity
    ))]
    pub async fn process(&self, input: TurnInput) -> TurnOutcome {
        let start = Instant::now();

        let session = match self
            .sessions
            .get_or_create_conversation(&input.session_id, &input.user_identity)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Could not resolve session");
                return TurnOutcome::degraded(e.user_message());
            }
        };
        let conversation_id = session.conversation.id;

        if is_farewell(&input.utterance) {
            return self.farewell(&input, &session).await;
        }

        if let Err(e) = self
            .sessions
            .append_message(conversation_id, NewMessage::user(&input.utterance))
            .await
        {
            warn!(conversation_id = %conversation_id, error = %e, "Failed to persist user message");
            let mut outcome = TurnOutcome::degraded(DEGRADED_REPLY);
            outcome.conversation_id = Some(conversation_id);
            return outcome;
        }

        let mut messages = self.build_messages(&session, &input.utterance).await;
        let tools = self.runner.registry().definitions_for(session.user.role);
        let orders: Arc<dyn OrderGate> = self.workflow.clone();
        let ctx = ToolContext::new(session.user.clone(), Arc::clone(&self.store), orders)
            .with_conversation(conversation_id);

        let mut records: Vec<ToolCallRecord> = Vec::new();
        let mut rounds = 0;
        let mut log_complete = true;
        let (reply, mut status) = loop {
            if rounds >= self.config.max_tool_rounds {
                warn!(
                    conversation_id = %conversation_id,
                    rounds,
                    "Tool round limit reached"
                );
                break (FALLBACK_APOLOGY.to_string(), TurnStatus::RoundLimit);
            }
            rounds += 1;

            let request = ToolCompletionRequest::new(
                CompletionRequest::new(&self.config.model)
                    .with_messages(messages.clone())
                    .with_max_tokens(self.config.max_tokens)
                    .with_temperature(self.config.temperature),
                tools.clone(),
            );

            let response = match self.call_llm(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(conversation_id = %conversation_id, round = rounds, error = %e, "LLM unavailable");
                    break (FALLBACK_APOLOGY.to_string(), TurnStatus::LlmUnavailable);
                }
            };

            if !response.has_tool_calls() {
                let text = response.final_text().unwrap_or(EMPTY_REPLY);
                break (text.to_string(), TurnStatus::Completed);
            }

            debug!(
                round = rounds,
                calls = response.tool_calls.len(),
                "LLM requested tools"
            );
            messages.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));
            log_complete &= self
                .execute_tool_calls(
                    conversation_id,
                    &response.tool_calls,
                    &ctx,
                    &mut messages,
                    &mut records,
                )
                .await;
        };

        let spoken_text = truncate_for_voice(&reply, self.config.max_response_chars);

        if let Err(e) = self
            .sessions
            .append_message(conversation_id, NewMessage::assistant(&spoken_text))
            .await
        {
            warn!(conversation_id = %conversation_id, error = %e, "Failed to persist reply");
            log_complete = false;
        }
        if !log_complete {
            status = TurnStatus::Degraded;
        }

        if status == TurnStatus::Completed && self.config.extraction_enabled {
            let transcript = Transcript::turn(
                session.user.id,
                Some(conversation_id),
                &input.utterance,
                &spoken_text,
            );
            if let Err(e) = self.memory.process(&transcript).await {
                warn!(conversation_id = %conversation_id, error = %e, "Fact extraction failed");
            }
        }

        info!(
            conversation_id = %conversation_id,
            rounds,
            tool_calls = records.len(),
            status = ?status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Turn completed"
        );

        TurnOutcome {
            spoken_text,
            should_end_session: false,
            conversation_id: Some(conversation_id),
            rounds,
            tool_calls: records,
            status,
        }
    }

    /// System prompt plus the history window. Long-term memory that fails
    /// to load is left out of the prompt rather than failing the turn.
    async fn build_messages(&self, session: &Session, utterance: &str) -> Vec<Message> {
        let user = &session.user;

        let facts = match self.store.list_facts(user.id).await {
            Ok(all) => relevant_facts(&all, utterance, self.config.relevant_fact_limit, Utc::now()),
            Err(e) => {
                warn!(error = %e, "Failed to load facts");
                Vec::new()
            }
        };
        let preferences = match self.store.list_preferences(user.id).await {
            Ok(mut prefs) => {
                prefs.truncate(self.config.preference_limit);
                prefs
            }
            Err(e) => {
                warn!(error = %e, "Failed to load preferences");
                Vec::new()
            }
        };
        let summaries = self
            .store
            .recent_summaries(user.id, self.config.summary_limit)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load conversation summaries");
                Vec::new()
            });

        let system = build_system_prompt(&PromptContext {
            user,
            facts: &facts,
            preferences: &preferences,
            summaries: &summaries,
            now: Local::now(),
        });
        debug!(facts = facts.len(), preferences = preferences.len(), "System prompt built");

        let mut messages = vec![Message::system(system)];
        match self.sessions.recent_history(session.conversation.id).await {
            Ok(history) => messages.extend(history_to_messages(&history)),
            Err(e) => {
                warn!(error = %e, "Failed to load history, continuing with the utterance only");
                messages.push(Message::user(utterance));
            }
        }
        messages
    }

    /// One LLM call with a timeout and a single retry on transport errors
    async fn call_llm(&self, request: ToolCompletionRequest) -> crate::error::Result<ToolCompletionResponse> {
        let timeout = self.config.llm_timeout;
        retry_with_backoff(
            &self.config.retry,
            || {
                let request = request.clone();
                async move {
                    match tokio::time::timeout(timeout, self.llm.complete_with_tools(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(jarvis_llm::Error::Timeout(timeout.as_millis() as u64)),
                    }
                }
            },
            jarvis_llm::Error::is_transport,
        )
        .await
        .map_err(|e| Error::Transport(e.into_inner().to_string()))
    }

    async fn farewell(&self, input: &TurnInput, session: &Session) -> TurnOutcome {
        let conversation_id = session.conversation.id;
        let mut status = TurnStatus::Farewell;
        for message in [
            NewMessage::user(&input.utterance),
            NewMessage::assistant(FAREWELL_REPLY),
        ] {
            if let Err(e) = self.sessions.append_message(conversation_id, message).await {
                warn!(conversation_id = %conversation_id, error = %e, "Failed to persist farewell");
                status = TurnStatus::Degraded;
            }
        }
        if let Err(e) = self.end_session(&input.session_id).await {
            warn!(error = %e, "Failed to end session");
        }

        TurnOutcome {
            spoken_text: FAREWELL_REPLY.to_string(),
            should_end_session: true,
            conversation_id: Some(conversation_id),
            rounds: 0,
            tool_calls: Vec::new(),
            status,
        }
    }
}
