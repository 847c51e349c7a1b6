//! Data models for the relay.
//!
//! - `chat`: the subset of the OpenAI Chat Completions request model sent upstream.
//! - `insights`: the inbound telemetry payload, the normalized model output and the response envelope.

pub mod chat;
pub mod insights;

pub use chat::{ChatCompletionRequest, ChatMessage, Role};
pub use insights::{
    AnalysisRequest, AnalysisResult, Confidence, EnvelopeMeta, Hypothesis, InsightReport,
    InsightsEnvelope, ServiceRecord, PROVIDER_NAME,
};
