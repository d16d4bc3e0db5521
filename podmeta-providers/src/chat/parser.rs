//! Chat-completions response parser.

use podmeta_core::{ApiResponse, ProviderKind};
use podmeta_fetch::FetchError;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::wire::ChatResponse;

/// Parses a 2xx chat-completions body into the raw metadata object.
///
/// # Errors
///
/// Returns [`FetchError::MalformedResponse`] when the envelope has no
/// choices, the content is empty, or the content is not a JSON object.
pub fn parse_chat_response(
    provider: ProviderKind,
    status: u16,
    body: &str,
) -> Result<ApiResponse, FetchError> {
    debug!(len = body.len(), %provider, "Parsing chat completion");

    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(provider, Some(status), format!("invalid response envelope: {e}")))?;

    let choice = response
        .choices
        .first()
        .ok_or_else(|| FetchError::malformed(provider, Some(status), "response has no choices"))?;

    let text = choice.message.as_ref().map(|m| m.text()).unwrap_or_default();
    if text.trim().is_empty() {
        let reason = choice.finish_reason.as_deref().unwrap_or("unknown");
        return Err(FetchError::malformed(
            provider,
            Some(status),
            format!("empty message content (finish_reason: {reason})"),
        ));
    }

    parse_content(provider, status, &text)
}

/// Parses the assistant's message text as the metadata object.
///
/// # Errors
///
/// Returns [`FetchError::MalformedResponse`] if the text is not a JSON object.
pub fn parse_content(
    provider: ProviderKind,
    status: u16,
    content: &str,
) -> Result<ApiResponse, FetchError> {
    let json = strip_code_fence(content);

    let value: Value = serde_json::from_str(json).map_err(|e| {
        FetchError::malformed(provider, Some(status), format!("content is not valid JSON: {e}"))
    })?;

    if !value.is_object() {
        return Err(FetchError::malformed(
            provider,
            Some(status),
            "content is not a JSON object",
        ));
    }

    serde_json::from_value(value).map_err(|e| {
        FetchError::malformed(provider, Some(status), format!("unexpected metadata shape: {e}"))
    })
}

/// Removes a surrounding markdown code fence and any prose around the object.
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json") on the opening fence line.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    if !text.starts_with('{') {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                return &text[start..=end];
            }
        }
    }

    text
}

/// Extracts a human-readable message from an error body.
///
/// Looks at `error.message`, then a string `error`, then `message` and
/// `detail`; falls back to the HTTP status line.
pub fn error_message(body: &str, status: StatusCode) -> String {
    let from_body = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        let nested = v.get("error").and_then(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => e.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        });
        nested
            .or_else(|| v.get("message").and_then(Value::as_str).map(str::to_string))
            .or_else(|| v.get("detail").and_then(Value::as_str).map(str::to_string))
    });

    match from_body {
        Some(message) if !message.trim().is_empty() => message.trim().to_string(),
        _ => match status.canonical_reason() {
            Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
            None => format!("HTTP {}", status.as_u16()),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> String {
        serde_json::json!({
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
        .to_string()
    }

    #[test]
    fn test_parse_plain_content() {
        let body = completion(r#"{"title":"Cat","description":"A cat.","tags":["cat","kitten"]}"#);
        let raw = parse_chat_response(ProviderKind::Mistral, 200, &body).unwrap();
        assert_eq!(raw.title, "Cat");
        assert_eq!(raw.tag_strings(), vec!["cat", "kitten"]);
        assert!(raw.main_tag.is_none());
    }

    #[test]
    fn test_parse_fenced_content() {
        let body = completion("```json\n{\"title\":\"Cat\",\"tags\":[],\"mainTag\":\"cat lover\"}\n```");
        let raw = parse_chat_response(ProviderKind::Groq, 200, &body).unwrap();
        assert_eq!(raw.title, "Cat");
        assert_eq!(raw.main_tag.as_deref(), Some("cat lover"));
    }

    #[test]
    fn test_no_choices_is_malformed() {
        let err = parse_chat_response(ProviderKind::Groq, 200, r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.kind(), podmeta_fetch::ErrorKind::MalformedResponse);
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_error_message_shapes() {
        let status = StatusCode::UNAUTHORIZED;
        assert_eq!(
            error_message(r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#, status),
            "Invalid API Key"
        );
        assert_eq!(error_message(r#"{"message":"Unauthorized"}"#, status), "Unauthorized");
        assert_eq!(error_message(r#"{"error":"bad key"}"#, status), "bad key");
        assert_eq!(error_message("<html>nope</html>", status), "HTTP 401 Unauthorized");
        assert_eq!(error_message("", StatusCode::TOO_MANY_REQUESTS), "HTTP 429 Too Many Requests");
    }
}
