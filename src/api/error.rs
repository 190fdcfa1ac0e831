//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jarvis_core::Error;
use serde::Serialize;
use tracing::error;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Core error carried to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for the wrapped error
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Authorization(_) => StatusCode::FORBIDDEN,
            Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::Transport(_) | Error::Llm(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
