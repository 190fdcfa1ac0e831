//! Runner - Timeout-guarded tool execution
//!
//! Wraps [`ToolRegistry::dispatch`] so that no handler can hang a turn.

use crate::context::ToolContext;
use crate::error::{Error, Result};
use crate::registry::{ToolOutput, ToolRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Configuration for the tool runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound for a single tool call
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl RunnerConfig {
    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Tool runner
pub struct ToolRunner {
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl ToolRunner {
    /// Create a new tool runner
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, RunnerConfig::default())
    }

    /// Get the registry
    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run a tool by name
    #[instrument(skip(self, args, ctx), fields(tool = %tool_name))]
    pub async fn run(
        &self,
        tool_name: &str,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput> {
        let start = Instant::now();
        debug!(timeout_ms = %self.config.timeout.as_millis(), "Executing tool");

        let result = match timeout(
            self.config.timeout,
            self.registry.dispatch(tool_name, args, ctx),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                warn!(timeout_ms = %self.config.timeout.as_millis(), "Tool execution timed out");
                return Err(Error::Timeout(elapsed));
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(duration_ms, "Tool execution completed"),
            Err(e) => warn!(duration_ms, kind = %e.kind(), error = %e, "Tool execution failed"),
        }
        result
    }
}
