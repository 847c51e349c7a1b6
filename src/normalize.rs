//! Best-effort extraction of structured output from a completion.
//!
//! The model is asked for strict JSON but not guaranteed to produce it, so parsing is an
//! ordered chain of attempts: whole content, then the outermost brace-delimited span, then the
//! raw text itself. Every input yields a result.

use serde_json::Value;

use crate::models::insights::AnalysisResult;

/// Text of the first choice: `choices[0].message.content`.
pub fn extract_content(completion: &Value) -> Option<&str> {
    completion
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Normalize a full provider body. Missing content is treated as empty text.
pub fn normalize_completion(completion: &Value) -> AnalysisResult {
    let content = extract_content(completion).unwrap_or_default();
    normalize_content(content)
}

pub fn normalize_content(content: &str) -> AnalysisResult {
    parse_strict(content)
        .or_else(|| parse_braced(content))
        .map(AnalysisResult::Structured)
        .unwrap_or_else(|| AnalysisResult::RawText {
            text: content.to_string(),
        })
}

fn parse_strict(content: &str) -> Option<Value> {
    serde_json::from_str(content).ok()
}

/// Parse the span from the first `{` to the last `}`.
fn parse_braced(content: &str) -> Option<Value> {
    braced_span(content).and_then(parse_strict)
}

fn braced_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}
