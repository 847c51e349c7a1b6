use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Provider name reported in `meta.provider`.
pub const PROVIDER_NAME: &str = "openai";

/// Telemetry for one microservice.
///
/// The record is opaque to the relay: it is kept as the caller sent it and only serialized into
/// the prompt. Typical fields are `id`, `name`, `lastStatus`, `lastRespTime` and `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRecord(pub Value);

impl ServiceRecord {
    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn last_status(&self) -> Option<&Value> {
        self.0.get("lastStatus")
    }
}

/// Inbound body of `POST /api/ai-insights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub services: Vec<ServiceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl AnalysisRequest {
    /// Validate a parsed request body. `services` must be present and be an array.
    pub fn from_payload(payload: &Value) -> Result<Self, AppError> {
        let services = match payload.get("services") {
            Some(Value::Array(items)) => items.iter().cloned().map(ServiceRecord).collect(),
            _ => return Err(AppError::BadRequest("missing services".into())),
        };
        let context = payload.get("context").filter(|c| !c.is_null()).cloned();
        Ok(Self { services, context })
    }
}

/// Normalized model output.
///
/// Serialized untagged: a structured result is emitted verbatim, a raw result as
/// `{ "text": "<content>" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Structured(Value),
    RawText { text: String },
}

impl AnalysisResult {
    pub fn is_structured(&self) -> bool {
        matches!(self, AnalysisResult::Structured(_))
    }

    /// Typed view of a structured result, if it has the expected shape.
    pub fn report(&self) -> Option<InsightReport> {
        match self {
            AnalysisResult::Structured(v) => serde_json::from_value(v.clone()).ok(),
            AnalysisResult::RawText { .. } => None,
        }
    }
}

/// The structured answer the prompt asks for. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    #[serde(default)]
    pub summary: Value,
    #[serde(default)]
    pub issues: Vec<Value>,
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
    #[serde(default)]
    pub actions: Vec<Value>,
    #[serde(default)]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub hypothesis: String,
    #[serde(default)]
    pub confidence: Confidence,
}

/// Confidence level of a root-cause hypothesis. Parsed case-insensitively; anything
/// unrecognized becomes `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Med,
    High,
    #[default]
    Unknown,
}

impl From<String> for Confidence {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Confidence::Low,
            "med" | "medium" => Confidence::Med,
            "high" => Confidence::High,
            _ => Confidence::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub model: String,
    pub provider: String,
}

/// Success body of `POST /api/ai-insights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsEnvelope {
    pub ok: bool,
    /// The original request payload, echoed untouched.
    pub query: Value,
    pub ai: AnalysisResult,
    pub meta: EnvelopeMeta,
}

impl InsightsEnvelope {
    pub fn new(query: Value, ai: AnalysisResult, model: impl Into<String>) -> Self {
        Self {
            ok: true,
            query,
            ai,
            meta: EnvelopeMeta {
                model: model.into(),
                provider: PROVIDER_NAME.to_string(),
            },
        }
    }
}
