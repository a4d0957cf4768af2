//! Provider error sanitization
//!
//! Error bodies from the provider can echo request headers or keys. They are
//! redacted and size-limited before ending up in an error message or event.

use crate::error::PulseError;
use crate::utils::truncate_str;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_ERROR_TEXT_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

static BEARER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer token regex")
});

static KEY_VALUE_SECRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|access[_-]?token|token|secret|password|authorization)\b\s*[:=]\s*["']?[^"',\s}]+"#,
    )
    .expect("valid key/value secret regex")
});

static OPENAI_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsk-[A-Za-z0-9_\-]{8,}").expect("valid api key regex"));

/// Redact secrets and cap the length of a provider error body
pub fn sanitize_error_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error body>".to_string();
    }

    let text = match serde_json::from_str::<Value>(trimmed) {
        Ok(mut json) => {
            redact_json(&mut json);
            // Prefer the provider's own message when it has one
            extract_message(&json).unwrap_or_else(|| json.to_string())
        }
        Err(_) => redact_inline(trimmed),
    };
    limit(text)
}

/// Error for a non-2xx provider response
pub fn status_error(provider: &str, status: u16, body: &str) -> PulseError {
    PulseError::llm_with_provider(
        format!(
            "{} returned status {}: {}",
            provider,
            status,
            sanitize_error_text(body)
        ),
        provider,
    )
}

/// Message of an `{"error": ...}` object embedded in a stream chunk
pub fn stream_error_message(chunk: &Value) -> Option<String> {
    let error = chunk.get("error")?;
    let mut error = error.clone();
    redact_json(&mut error);
    let message = match &error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    };
    Some(limit(message))
}

fn extract_message(json: &Value) -> Option<String> {
    json.get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(Value::as_str)
        .or_else(|| json.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_json(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        Value::String(s) => *s = redact_inline(s),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    ["api_key", "token", "secret", "password", "authorization", "cookie"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

fn redact_inline(input: &str) -> String {
    let text = BEARER_TOKEN_RE.replace_all(input, "Bearer [REDACTED]");
    let text = KEY_VALUE_SECRET_RE.replace_all(&text, "$1=[REDACTED]");
    OPENAI_KEY_RE.replace_all(&text, REDACTED).into_owned()
}

fn limit(text: String) -> String {
    let kept = truncate_str(&text, MAX_ERROR_TEXT_CHARS);
    if kept.len() == text.len() {
        return text;
    }
    let dropped = text[kept.len()..].chars().count();
    format!("{}... [truncated {} chars]", kept, dropped)
}
