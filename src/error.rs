//! Request-level errors and their JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::provider::ProviderError;

/// Terminal failure of an insight request. Every variant renders a JSON body with an `error` key.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body could not be read, e.g. over the size limit.
    #[error("request body rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("server misconfigured: {0}")]
    Misconfigured(String),

    #[error("upstream provider returned {status}")]
    Upstream { status: StatusCode, body: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        AppError::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected { status, .. } => *status,
            AppError::Misconfigured(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            AppError::Unauthorized => json!({ "error": "Unauthorized" }),
            AppError::BadRequest(msg) => json!({ "error": msg }),
            AppError::Rejected { message, .. } => json!({ "error": message }),
            AppError::Misconfigured(msg) => {
                json!({ "error": format!("Server misconfigured: {msg}") })
            }
            AppError::Upstream { status, body } => json!({
                "error": "AI provider error",
                "status": status.as_u16(),
                "body": body,
            }),
            AppError::Internal(details) => json!({
                "error": "internal_server_error",
                "details": details,
            }),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::MissingApiKey => AppError::Misconfigured("missing OPENAI_API_KEY".into()),
            ProviderError::Upstream { status, body } => AppError::Upstream { status, body },
            other => AppError::internal(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
