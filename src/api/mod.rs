//! Web API module for Jarvis
//!
//! Provides REST API endpoints for:
//! - Voice turns, greetings and session end (called by the voice bridge)
//! - Order approval decisions
//! - Health checks

pub mod error;
pub mod health;
pub mod orders;
pub mod voice;

use axum::{Extension, Router};
use jarvis_core::Orchestrator;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use error::ApiError;
pub use health::health_routes;
pub use orders::orders_routes;
pub use voice::voice_routes;

/// Create the full application router around a shared orchestrator
pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(voice_routes())
        .merge(orders_routes())
        .layer(Extension(orchestrator))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests;
