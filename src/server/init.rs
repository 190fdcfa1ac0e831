//! Server initialization and main run loop
//!
//! Contains the main `run()` function that wires the store, tools and
//! orchestrator and serves the HTTP API.

use super::config::{AppConfig, LlmBackend};
use super::providers::resolve_llm_provider;
use anyhow::{Context, Result};
use jarvis_core::{Orchestrator, RuleBasedExtractor};
use jarvis_llm::LlmProvider;
use jarvis_memory::{MemoryStore, SqliteStore};
use jarvis_tools::{register_builtins_with_config, BuiltinsConfig, ToolRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting Jarvis v{}", env!("CARGO_PKG_VERSION"));

    let store = SqliteStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")?;
    let store: Arc<dyn MemoryStore> = Arc::new(store);
    info!(url = %config.database.url, "Memory store ready");

    let llm = resolve_llm_provider(&config.llm)?;
    let orchestrator = Arc::new(build_orchestrator(&config, llm, store));
    info!(
        provider = %orchestrator.provider_name(),
        tools = orchestrator.list_tool_names().len(),
        "Orchestrator initialized"
    );

    let app = crate::api::router(orchestrator);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Jarvis shutdown complete");
    Ok(())
}

/// Wire tools and extraction around the given provider and store
pub fn build_orchestrator(
    config: &AppConfig,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn MemoryStore>,
) -> Orchestrator {
    let mut registry = ToolRegistry::new();
    register_builtins_with_config(
        &mut registry,
        &BuiltinsConfig {
            weather_api_key: config.tools.weather_api_key.clone(),
        },
    );
    if config.tools.weather_api_key.is_none() {
        warn!("No weather API key configured; weather lookups will fail");
    }

    let orchestrator = Orchestrator::new(
        llm,
        Arc::new(registry),
        store,
        config.orchestrator_config(),
    );

    // canned replies make LLM extraction meaningless
    if config.llm.provider == LlmBackend::Mock {
        orchestrator.with_extractor(Arc::new(RuleBasedExtractor::new()))
    } else {
        orchestrator
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
