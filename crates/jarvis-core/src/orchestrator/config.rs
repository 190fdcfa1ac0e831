//! Orchestrator configuration
//!
//! Contains configuration types for the orchestrator:
//! - `OrchestratorConfig` for orchestrator settings
//! - `TurnInput` for one inbound utterance

use crate::utils::RetryConfig;
use jarvis_tools::RunnerConfig;
use std::time::Duration;

/// One utterance delivered by the voice adapter
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// External session id
    pub session_id: String,
    /// Stable caller identity
    pub user_identity: String,
    /// What was said
    pub utterance: String,
}

impl TurnInput {
    /// Create a new input
    #[must_use]
    pub fn new(
        session_id: impl Into<String>,
        user_identity: impl Into<String>,
        utterance: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_identity: user_identity.into(),
            utterance: utterance.into(),
        }
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model used for the conversation
    pub model: String,
    /// Model used for extraction and summaries
    pub extraction_model: String,
    /// Completion token limit per call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tool-call rounds per turn
    pub max_tool_rounds: usize,
    /// Messages of history sent to the LLM
    pub history_window: u32,
    /// Facts placed in the system prompt
    pub relevant_fact_limit: usize,
    /// Preferences placed in the system prompt
    pub preference_limit: usize,
    /// Past conversation summaries placed in the system prompt
    pub summary_limit: u32,
    /// Timeout for each LLM call
    pub llm_timeout: Duration,
    /// Retry for LLM transport failures
    pub retry: RetryConfig,
    /// Tool runner settings
    pub runner_config: RunnerConfig,
    /// Longest spoken reply, in characters
    pub max_response_chars: usize,
    /// Whether to extract facts after each turn
    pub extraction_enabled: bool,
    /// Jaccard threshold above which a candidate reinforces a stored fact
    pub similarity_threshold: f64,
    /// Transcripts shorter than this skip extraction
    pub min_transcript_chars: usize,
    /// Sessions with fewer messages close without a summary
    pub summary_min_messages: i64,
    /// Platform recorded on new conversations
    pub platform: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            extraction_model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            max_tool_rounds: 5,
            history_window: 20,
            relevant_fact_limit: 10,
            preference_limit: 10,
            summary_limit: 3,
            llm_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            runner_config: RunnerConfig::default(),
            max_response_chars: 300,
            extraction_enabled: true,
            similarity_threshold: 0.8,
            min_transcript_chars: 20,
            summary_min_messages: 4,
            platform: "alexa".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversation model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the extraction model
    #[must_use]
    pub fn with_extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = model.into();
        self
    }

    /// Set maximum tool-call rounds (at least one)
    #[must_use]
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    /// Set the history window
    #[must_use]
    pub fn with_history_window(mut self, window: u32) -> Self {
        self.history_window = window.max(1);
        self
    }

    /// Set the LLM call timeout
    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Set the retry configuration
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set runner configuration
    #[must_use]
    pub fn with_runner_config(mut self, config: RunnerConfig) -> Self {
        self.runner_config = config;
        self
    }

    /// Set the spoken reply length limit
    #[must_use]
    pub fn with_max_response_chars(mut self, chars: usize) -> Self {
        self.max_response_chars = chars;
        self
    }

    /// Enable or disable per-turn extraction
    #[must_use]
    pub fn with_extraction(mut self, enabled: bool) -> Self {
        self.extraction_enabled = enabled;
        self
    }

    /// Set the platform name
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}
