//! Chat-completions wire types.

use podmeta_core::prompt::{SYSTEM_INSTRUCTION, TEMPERATURE, user_prompt};
use podmeta_core::{ImagePayload, Marketplace};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request
// ============================================================================

/// Request body for `POST {base}/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// System instruction followed by the user turn.
    pub messages: Vec<ChatMessage>,
    /// Always `{"type": "json_object"}`.
    pub response_format: ResponseFormat,
    /// Sampling temperature.
    pub temperature: f32,
}

impl ChatRequest {
    /// Builds the vision request for one image and marketplace.
    pub fn vision(model: &str, image: &ImagePayload, market: Marketplace) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage::System {
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage::User {
                    content: vec![
                        ContentPart::Text {
                            text: user_prompt(market),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: image.data_url(),
                            },
                        },
                    ],
                },
            ],
            response_format: ResponseFormat::json_object(),
            temperature: TEMPERATURE,
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    /// System instruction.
    System {
        /// Instruction text.
        content: String,
    },
    /// User turn with text and image parts.
    User {
        /// Message parts.
        content: Vec<ContentPart>,
    },
}

/// One part of a multimodal user message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// Prompt text.
        text: String,
    },
    /// Inline image.
    ImageUrl {
        /// Image reference.
        image_url: ImageUrl,
    },
}

/// Image reference, here always a `data:` URL.
#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    /// `data:<mime>;base64,<payload>`
    pub url: String,
}

/// Requested response format.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    /// Format name.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    /// JSON object mode.
    pub fn json_object() -> Self {
        Self { kind: "json_object" }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Response body of a successful chat completion.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Completion choices; only the first is used.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct Choice {
    /// Assistant message.
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message of a choice.
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    /// Either a string or an array of `{"type": "text", "text": ...}` chunks.
    #[serde(default)]
    pub content: serde_json::Value,
}

impl ChoiceMessage {
    /// Returns the message text, joining chunked content.
    pub fn text(&self) -> String {
        match &self.content {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(parts) => parts
                .iter()
                .filter_map(|p| p.get("text").and_then(serde_json::Value::as_str))
                .collect::<String>(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vision_request_shape() {
        let image = ImagePayload::new("aGVsbG8=", "image/png").unwrap();
        let request = ChatRequest::vision("pixtral-large-latest", &image, Marketplace::TeePublic);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "pixtral-large-latest");
        assert_eq!(value["response_format"], json!({"type": "json_object"}));
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"].as_str().unwrap().contains("JSON"));

        assert_eq!(messages[1]["role"], "user");
        let parts = messages[1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert!(parts[0]["text"].as_str().unwrap().contains("mainTag"));
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_choice_text_variants() {
        let plain: ChoiceMessage = serde_json::from_value(json!({"content": "{}"})).unwrap();
        assert_eq!(plain.text(), "{}");

        let chunked: ChoiceMessage = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "{\"title\":"}, {"type": "text", "text": "\"x\"}"}]
        }))
        .unwrap();
        assert_eq!(chunked.text(), "{\"title\":\"x\"}");

        let null: ChoiceMessage = serde_json::from_value(json!({"content": null})).unwrap();
        assert_eq!(null.text(), "");
    }
}
