//! Voice endpoints
//!
//! POST /v1/turn - Process one utterance
//! POST /v1/session/end - Close a voice session
//! GET /v1/greeting/:user_identity - Opening line for a session

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use jarvis_core::{Error, Orchestrator, TurnInput, TurnStatus};
use jarvis_memory::MemoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::error::ApiError;

/// One utterance from the voice bridge
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    pub user_identity: String,
    pub utterance_text: String,
}

/// Spoken reply for a turn
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub spoken_text: String,
    pub should_end_session: bool,
    pub status: TurnStatus,
}

/// Request to close a session
#[derive(Debug, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: String,
    pub user_identity: String,
}

/// Text for the voice bridge to speak
#[derive(Debug, Serialize)]
pub struct SpokenResponse {
    pub spoken_text: String,
}

async fn handle_turn(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Json(request): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    if request.session_id.trim().is_empty() || request.user_identity.trim().is_empty() {
        return Err(Error::InvalidRequest("session_id and user_identity are required".into()).into());
    }

    let outcome = orchestrator
        .process(TurnInput::new(
            request.session_id,
            request.user_identity,
            request.utterance_text,
        ))
        .await;

    Ok(Json(TurnResponse {
        spoken_text: outcome.spoken_text,
        should_end_session: outcome.should_end_session,
        status: outcome.status,
    }))
}

async fn end_session(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<SpokenResponse>, ApiError> {
    if let Some(open) = orchestrator.sessions().find_open(&request.session_id).await? {
        let owner = orchestrator
            .store()
            .get_user_by_identity(&request.user_identity)
            .await
            .map_err(Error::from)?;
        if owner.map(|u| u.id) != Some(open.user_id) {
            return Err(Error::Authorization("session belongs to another user".into()).into());
        }
    }

    if orchestrator.end_session(&request.session_id).await?.is_none() {
        warn!(session_id = %request.session_id, "No open conversation to end");
    }

    Ok(Json(SpokenResponse {
        spoken_text: jarvis_core::orchestrator::FAREWELL_REPLY.to_string(),
    }))
}

async fn greeting(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(user_identity): Path<String>,
) -> Result<Json<SpokenResponse>, ApiError> {
    let spoken_text = orchestrator.greeting(&user_identity).await?;
    Ok(Json(SpokenResponse { spoken_text }))
}

/// Create voice routes
pub fn voice_routes() -> Router {
    Router::new()
        .route("/v1/turn", post(handle_turn))
        .route("/v1/session/end", post(end_session))
        .route("/v1/greeting/:user_identity", get(greeting))
}
