//! Shared-secret gate for the insight endpoint.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderMap;

use crate::error::AppError;
use crate::util::AppState;

/// Header carrying the dashboard's shared secret.
pub const SECRET_HEADER: &str = "x-dashboard-secret";

/// True when the header is present, valid UTF-8 and equal to `expected`.
pub fn secret_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|supplied| !supplied.is_empty() && supplied == expected)
}

/// Middleware rejecting requests without the configured secret before the body is read.
pub async fn require_dashboard_secret(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !secret_matches(req.headers(), &state.config.dashboard_secret) {
        tracing::warn!(
            path = %req.uri().path(),
            has_header = req.headers().contains_key(SECRET_HEADER),
            "rejected request: missing or invalid dashboard secret"
        );
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(req).await)
}
