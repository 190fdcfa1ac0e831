//! Session summaries
//!
//! Written once when a session closes and shown in later prompts under
//! "recent conversations".

use super::candidate::Transcript;
use crate::error::{Error, Result};
use jarvis_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SUMMARY_PROMPT: &str = "Summarize this conversation in 2-3 sentences. Focus on what the user asked for and any decisions made.\n\n";

/// Longest summary kept, in characters
const MAX_SUMMARY_CHARS: usize = 500;

/// Asks the LLM for a short summary of a finished session
pub struct SessionSummarizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    timeout: Duration,
}

impl SessionSummarizer {
    /// Create a summarizer using `model`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Give up on the summary call after `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Summarize the transcript
    pub async fn summarize(&self, transcript: &Transcript) -> Result<String> {
        let request = CompletionRequest::new(&self.model)
            .with_message(Message::user(format!(
                "{SUMMARY_PROMPT}{}",
                transcript.render()
            )))
            .with_max_tokens(200)
            .with_temperature(0.3);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                Error::Extraction(format!(
                    "summary call timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| Error::Extraction(format!("summary call failed: {e}")))?;

        let summary = response.content.trim();
        if summary.is_empty() {
            return Err(Error::Extraction("empty summary".to_string()));
        }
        let summary: String = summary.chars().take(MAX_SUMMARY_CHARS).collect();
        debug!(chars = summary.len(), "Session summarized");
        Ok(summary)
    }
}
