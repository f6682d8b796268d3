//! Wire payloads for the OpenRouter chat-completions API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod gemini;
pub mod models;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: ChatContent,
}

/// Either a plain string or a list of typed parts for vision requests.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Image element carrying `data:<mime>;base64,<payload>`.
    pub fn inline_image(mime_type: &str, base64_payload: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{mime_type};base64,{base64_payload}"),
            },
        }
    }
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: ChatContent::Text(content.into()),
        }
    }

    pub fn parts(role: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            role: role.into(),
            content: ChatContent::Parts(parts),
        }
    }
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Deserialize, Default)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    #[serde(default)]
    pub delta: ChatResponseDelta,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
}

impl ChatResponse {
    pub fn into_delta(self) -> Option<String> {
        self.choices.into_iter().next()?.delta.content
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelPricing {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub completion: String,
}

/// Catalog entry as served by `GET /models`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenRouterModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub pricing: ModelPricing,
}

#[derive(Deserialize)]
pub struct ModelsResponse {
    pub data: Vec<OpenRouterModel>,
}

/// Error envelope returned on non-success statuses.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub error: Option<Value>,
}

impl ErrorBody {
    /// Most specific human-readable message: `error.message`, then
    /// `error.metadata.raw`, then the serialized `error` value.
    pub fn summary(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            if !message.is_empty() {
                return Some(message.to_string());
            }
        }
        if let Some(raw) = error.pointer("/metadata/raw") {
            match raw {
                Value::String(raw) if !raw.is_empty() => return Some(raw.clone()),
                Value::Null | Value::String(_) => {}
                other => return Some(other.to_string()),
            }
        }
        match error {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
