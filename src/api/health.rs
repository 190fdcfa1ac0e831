//! Health check endpoints
//!
//! - `/health`: simple "healthy" + version (for load balancers)
//! - `/health/detailed`: store round-trip and the active LLM provider

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use jarvis_core::Orchestrator;
use jarvis_memory::MemoryStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Simple health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: ComponentHealth,
    pub llm_provider: String,
    pub tools: usize,
}

/// Individual component health status
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn detailed_health_check(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
) -> Json<DetailedHealthResponse> {
    let start = Instant::now();
    let store = match orchestrator.store().get_user_by_identity("health-check").await {
        Ok(_) => ComponentHealth {
            status: "healthy",
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => ComponentHealth {
            status: "unhealthy",
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    Json(DetailedHealthResponse {
        status: if store.status == "healthy" {
            "healthy"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        store,
        llm_provider: orchestrator.provider_name().to_string(),
        tools: orchestrator.list_tool_names().len(),
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/detailed", get(detailed_health_check))
}
