//! Server configuration types
//!
//! Contains all configuration structures for the Jarvis server.

use jarvis_core::{OrchestratorConfig, RetryConfig};
use jarvis_tools::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorAppConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Orchestrator settings assembled from the individual sections
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new()
            .with_model(&self.llm.model)
            .with_extraction_model(&self.llm.extraction_model)
            .with_max_tool_rounds(self.orchestrator.max_tool_rounds)
            .with_history_window(self.orchestrator.history_window)
            .with_llm_timeout(Duration::from_secs(self.llm.timeout_secs))
            .with_retry(
                RetryConfig::new()
                    .with_max_attempts(self.orchestrator.retry_attempts)
                    .with_initial_delay(Duration::from_millis(
                        self.orchestrator.retry_initial_delay_ms,
                    )),
            )
            .with_runner_config(
                RunnerConfig::default().with_timeout(Duration::from_secs(self.tools.timeout_secs)),
            )
            .with_max_response_chars(self.voice.max_response_chars)
            .with_extraction(self.extraction.enabled)
            .with_platform(&self.voice.platform);
        config.max_tokens = self.llm.max_tokens;
        config.temperature = self.llm.temperature;
        config.relevant_fact_limit = self.orchestrator.relevant_fact_limit;
        config.summary_limit = self.orchestrator.summary_limit;
        config.similarity_threshold = self.extraction.similarity_threshold;
        config.min_transcript_chars = self.extraction.min_transcript_chars;
        config.summary_min_messages = self.extraction.session_summary_min_messages;
        config
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite:data/jarvis.db?mode=rwc".to_string()
}
fn default_max_connections() -> u32 {
    5
}

/// Which LLM backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// OpenAI-compatible API
    #[default]
    Openai,
    /// Scripted provider, no network
    Mock,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmBackend,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::default(),
            model: default_model(),
            extraction_model: default_extraction_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_extraction_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    30
}

/// Orchestrator configuration (exposed to TOML)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorAppConfig {
    /// Maximum tool-call rounds per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    /// Messages of history sent to the LLM
    #[serde(default = "default_history_window")]
    pub history_window: u32,
    #[serde(default = "default_relevant_fact_limit")]
    pub relevant_fact_limit: usize,
    #[serde(default = "default_summary_limit")]
    pub summary_limit: u32,
    /// Total LLM attempts; 2 means one retry
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,
}

impl Default for OrchestratorAppConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            history_window: default_history_window(),
            relevant_fact_limit: default_relevant_fact_limit(),
            summary_limit: default_summary_limit(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
        }
    }
}

fn default_max_tool_rounds() -> usize {
    5
}
fn default_history_window() -> u32 {
    20
}
fn default_relevant_fact_limit() -> usize {
    10
}
fn default_summary_limit() -> u32 {
    3
}
fn default_retry_attempts() -> u32 {
    2
}
fn default_retry_initial_delay_ms() -> u64 {
    200
}

/// Fact extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_min_transcript_chars")]
    pub min_transcript_chars: usize,
    #[serde(default = "default_summary_min_messages")]
    pub session_summary_min_messages: i64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: default_similarity_threshold(),
            min_transcript_chars: default_min_transcript_chars(),
            session_summary_min_messages: default_summary_min_messages(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_similarity_threshold() -> f64 {
    0.8
}
fn default_min_transcript_chars() -> usize {
    20
}
fn default_summary_min_messages() -> i64 {
    4
}

/// Spoken reply configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
    #[serde(default = "default_platform")]
    pub platform: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            max_response_chars: default_max_response_chars(),
            platform: default_platform(),
        }
    }
}

fn default_max_response_chars() -> usize {
    300
}
fn default_platform() -> String {
    "alexa".to_string()
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub weather_api_key: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout(),
            weather_api_key: None,
        }
    }
}

fn default_tool_timeout() -> u64 {
    10
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}
