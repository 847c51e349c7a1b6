//! Prompt construction for the completion request.
//!
//! The system instruction is fixed; only the data message varies with the telemetry.

use crate::models::chat::{ChatCompletionRequest, ChatMessage};
use crate::models::insights::ServiceRecord;

/// Upper bound on completion length.
pub const MAX_TOKENS: u32 = 700;
/// Low randomness keeps the JSON contract stable.
pub const TEMPERATURE: f64 = 0.2;

pub const SYSTEM_PROMPT: &str = r#"You are an expert Site Reliability Engineer. Analyze the provided microservice health telemetry and produce:
1) summary of issues (top 3)
2) root-cause hypotheses with confidence (low/med/high)
3) prioritized remediation steps (short checklist)
4) a numeric risk score (0-100)
Return JSON only with keys: summary, issues (list), hypotheses (list of {service, hypothesis, confidence}), actions (list), riskScore."#;

const DATA_HEADER: &str = "Telemetry payload (services):";
const DATA_REMINDER: &str = "Give concise, actionable output as JSON.";

/// Render the data message: a pretty-printed dump of the services plus a trailing reminder.
pub fn build_user_content(services: &[ServiceRecord]) -> Result<String, serde_json::Error> {
    let dump = serde_json::to_string_pretty(services)?;
    Ok(format!("{DATA_HEADER}\n{dump}\n\n{DATA_REMINDER}"))
}

/// Build the outbound Chat Completions request for a batch of services.
pub fn build_chat_request(
    model: &str,
    services: &[ServiceRecord],
) -> Result<ChatCompletionRequest, serde_json::Error> {
    Ok(ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_content(services)?),
        ],
        max_tokens: Some(MAX_TOKENS),
        temperature: Some(TEMPERATURE),
    })
}
