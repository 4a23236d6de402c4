//! Parsing of `{"summary": "..."}` completions.

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("response has no 'summary' field")]
    MissingSummary,
    #[error("'summary' field is not a string")]
    SummaryNotString,
}

/// Extract the `summary` string from a model completion.
///
/// Markdown code fences and chatter around the JSON object are tolerated.
/// Extra keys are ignored.
pub fn parse_summary_payload(raw: &str) -> Result<String, PayloadError> {
    let value: Value = serde_json::from_str(extract_json(raw))?;
    let object = value.as_object().ok_or(PayloadError::NotAnObject)?;
    match object.get("summary") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(PayloadError::SummaryNotString),
        None => Err(PayloadError::MissingSummary),
    }
}

/// Extract JSON from an LLM response, handling markdown code blocks.
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    // Handle ```json ... ``` blocks
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Handle ``` ... ``` blocks
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        // Skip past any language identifier on the same line
        let after_tick = &trimmed[json_start..];
        let content_start = after_tick.find('\n').map_or(0, |n| n + 1);
        if let Some(end) = after_tick[content_start..].find("```") {
            return after_tick[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                return &trimmed[start..=end];
            }
        }
    }

    trimmed
}
