//! Extraction of structured decisions from free-form completions

use serde_json::{Map, Value};

use super::error::{DecisionError, DecisionResult};
use super::Decision;

/// Marker closing a reasoning model's hidden thoughts
pub const THINK_END_MARKER: &str = "</think>";

/// Parses model completions into decisions
#[derive(Debug, Clone)]
pub struct DecisionParser {
    marker: String,
}

impl Default for DecisionParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionParser {
    /// Parser that splits on `</think>`
    pub fn new() -> Self {
        Self::with_marker(THINK_END_MARKER)
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parse the first JSON object in `raw` as a decision
    ///
    /// When the completion carries a reasoning marker, the object is looked
    /// for after the marker first so braces inside the reasoning are ignored.
    pub fn parse(&self, raw: &str) -> DecisionResult<Decision> {
        let after_marker = raw.rfind(&self.marker).map(|idx| &raw[idx + self.marker.len()..]);

        let span = after_marker
            .and_then(json_object_span)
            .or_else(|| json_object_span(raw))
            .ok_or_else(|| DecisionError::Malformed("no JSON object found".to_string()))?;

        let value: Value = match serde_json::from_str(span) {
            Ok(value) => value,
            // Raw newlines inside string literals are invalid JSON
            Err(first) => serde_json::from_str(&span.replace(['\n', '\r'], ""))
                .map_err(|_| DecisionError::Malformed(format!("invalid JSON: {}", first)))?,
        };

        decision_from_value(value)
    }

    /// Text after the last marker, trimmed
    pub fn extract_final_text(&self, raw: &str) -> DecisionResult<String> {
        raw.rfind(&self.marker)
            .map(|idx| raw[idx + self.marker.len()..].trim().to_string())
            .ok_or_else(|| DecisionError::NoFinalText {
                marker: self.marker.clone(),
            })
    }
}

/// Brace-balanced span starting at the first `{`, skipping braces that
/// appear inside JSON string literals
fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

fn decision_from_value(value: Value) -> DecisionResult<Decision> {
    let Value::Object(mut object) = value else {
        return Err(DecisionError::Malformed("decision is not a JSON object".to_string()));
    };

    let tool_call = object.remove("tool_call").filter(|v| !v.is_null());
    let direct_answer = object.remove("direct_answer").filter(|v| !v.is_null());

    match (tool_call, direct_answer) {
        (Some(_), Some(_)) => Err(DecisionError::Malformed(
            "both tool_call and direct_answer are set".to_string(),
        )),
        (None, None) => Err(DecisionError::Malformed(
            "neither tool_call nor direct_answer is set".to_string(),
        )),
        (Some(call), None) => tool_invocation(call),
        (None, Some(Value::String(text))) => Ok(Decision::DirectAnswer { text }),
        (None, Some(_)) => Err(DecisionError::Malformed(
            "direct_answer must be a string".to_string(),
        )),
    }
}

fn tool_invocation(call: Value) -> DecisionResult<Decision> {
    let Value::Object(mut call) = call else {
        return Err(DecisionError::Malformed("tool_call must be an object".to_string()));
    };

    let tool_name = match call.remove("tool") {
        Some(Value::String(name)) => name,
        _ => return Err(DecisionError::Malformed("tool_call.tool must be a string".to_string())),
    };

    let arguments: Map<String, Value> = match call.remove("arguments") {
        Some(Value::Object(arguments)) => arguments,
        _ => {
            return Err(DecisionError::Malformed(
                "tool_call.arguments must be an object".to_string(),
            ))
        }
    };

    Ok(Decision::ToolInvocation { tool_name, arguments })
}
