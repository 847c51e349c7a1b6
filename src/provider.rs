//! Outbound client for the OpenAI Chat Completions endpoint.

use http::{header, StatusCode};
use serde_json::Value;

use crate::config::AppConfig;
use crate::models::chat::ChatCompletionRequest;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No credential configured; raised before any network activity.
    #[error("missing OPENAI_API_KEY")]
    MissingApiKey,

    #[error("provider returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider response was not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Single-shot Chat Completions client. No retries.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST the request and return the decoded provider body.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<Value, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        let url = self.completions_url();
        tracing::debug!(url = %url, model = %request.model, "sending completion request");

        let resp = self
            .http
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::error!(status = %status, body = %body, "OpenAI error");
            return Err(ProviderError::Upstream { status, body });
        }

        serde_json::from_slice(&bytes).map_err(ProviderError::Decode)
    }
}
