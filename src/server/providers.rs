//! LLM provider resolution

use super::config::{LlmBackend, LlmConfig};
use anyhow::{Context, Result};
use jarvis_llm::{LlmProvider, MockProvider, OpenAiConfig, OpenAiProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the configured LLM provider
pub fn resolve_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.provider {
        LlmBackend::Openai => {
            let openai = OpenAiConfig::from_env()
                .context("OpenAI provider selected but not configured")?
                .with_model(&config.model)
                .with_timeout(Duration::from_secs(config.timeout_secs));
            info!(model = %config.model, "Using OpenAI provider");
            Ok(Arc::new(OpenAiProvider::new(openai)))
        }
        LlmBackend::Mock => {
            warn!("Using mock LLM provider; replies are canned");
            Ok(Arc::new(MockProvider::new()))
        }
    }
}
