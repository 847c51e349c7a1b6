use std::sync::Arc;

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::require_dashboard_secret;
use crate::error::AppError;
use crate::models::insights::{AnalysisRequest, InsightsEnvelope};
use crate::normalize::normalize_completion;
use crate::prompt::build_chat_request;
use crate::util::{cors_layer, AppState};

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 256 * 1024;

/// Build the Axum router with `/api/ai-insights` and `/health`.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let state = Arc::new(state);

    let insights = post(ai_insights).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_dashboard_secret,
    ));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));

    Router::new()
        .route("/api/ai-insights", insights)
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(security_headers)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Liveness probe: always ok, with the current time in epoch milliseconds.
pub async fn health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "ts": chrono::Utc::now().timestamp_millis(),
    }))
}

/// `application/json` or any `application/*+json` media type, parameters ignored.
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Analyze service telemetry with the completion API and return the normalized result.
///
/// The secret gate runs as middleware before this handler.
async fn ai_insights(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<InsightsEnvelope>, AppError> {
    let body = body.map_err(|r| AppError::Rejected {
        status: r.status(),
        message: r.body_text(),
    })?;
    // A non-JSON body is treated as empty, so it carries no services.
    if !is_json_content_type(&headers) {
        tracing::debug!("rejecting body without a JSON content type");
        return Err(AppError::BadRequest("missing services".into()));
    }
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("invalid JSON body".into()))?;
    let request = AnalysisRequest::from_payload(&payload)?;

    let span = tracing::info_span!(
        "ai_insights",
        request_id = %Uuid::new_v4(),
        services = request.services.len(),
        model = %state.config.model,
    );

    async move {
        let names: Vec<&str> = request.services.iter().filter_map(|s| s.name()).collect();
        tracing::debug!(services = ?names, has_context = request.context.is_some(), "analyzing");

        let chat = build_chat_request(&state.config.model, &request.services)?;
        let completion = state.provider.complete(&chat).await?;
        let ai = normalize_completion(&completion);

        match ai.report() {
            Some(report) => tracing::info!(
                risk_score = ?report.risk_score,
                hypotheses = report.hypotheses.len(),
                actions = report.actions.len(),
                "analysis complete"
            ),
            None if ai.is_structured() => {
                tracing::info!("analysis complete; output did not match the report shape")
            }
            None => tracing::warn!("model output was not JSON; returning raw text"),
        }

        Ok::<_, AppError>(Json(InsightsEnvelope::new(
            payload,
            ai,
            state.config.model.clone(),
        )))
    }
    .instrument(span)
    .await
    .inspect_err(|e: &AppError| tracing::error!(error = %e, "insight request failed"))
}
