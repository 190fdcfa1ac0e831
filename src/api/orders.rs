//! Order approval endpoints
//!
//! GET /v1/orders/:id - Fetch an order
//! POST /v1/orders/:id/approve - Approve a pending order
//! POST /v1/orders/:id/reject - Reject a pending order with a reason
//! GET /v1/approvers/:identity/orders - Orders waiting on an approver

use axum::{
    extract::{Extension, Path},
    routing::{get, post},
    Json, Router,
};
use jarvis_core::{Error, Orchestrator};
use jarvis_memory::{MemoryStore, Order, User};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;

/// Approval decision from a household member
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub approver_identity: String,
    #[serde(default)]
    pub reason: Option<String>,
}

async fn resolve_approver(orchestrator: &Orchestrator, identity: &str) -> Result<User, ApiError> {
    orchestrator
        .store()
        .get_user_by_identity(identity)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| {
            Error::NotFound {
                entity: "user",
                id: identity.to_string(),
            }
            .into()
        })
}

async fn get_order(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(orchestrator.workflow().get(id).await?))
}

async fn approve_order(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Order>, ApiError> {
    let approver = resolve_approver(&orchestrator, &request.approver_identity).await?;
    Ok(Json(orchestrator.workflow().approve(id, &approver).await?))
}

async fn reject_order(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Order>, ApiError> {
    let approver = resolve_approver(&orchestrator, &request.approver_identity).await?;
    let reason = request.reason.unwrap_or_default();
    Ok(Json(orchestrator.workflow().reject(id, &approver, &reason).await?))
}

async fn pending_orders(
    Extension(orchestrator): Extension<Arc<Orchestrator>>,
    Path(identity): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let approver = resolve_approver(&orchestrator, &identity).await?;
    Ok(Json(orchestrator.workflow().pending_for_approver(&approver).await?))
}

/// Create order routes
pub fn orders_routes() -> Router {
    Router::new()
        .route("/v1/orders/:id", get(get_order))
        .route("/v1/orders/:id/approve", post(approve_order))
        .route("/v1/orders/:id/reject", post(reject_order))
        .route("/v1/approvers/:identity/orders", get(pending_orders))
}
