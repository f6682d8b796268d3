//! Wire payloads for the Gemini `streamGenerateContent` API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    Text {
        text: String,
    },
    /// Any part shape not modelled above, e.g. `executableCode`.
    Other(Value),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn is_empty_text(&self) -> bool {
        matches!(self, Part::Text { text } if text.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } | Part::Other(_) => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct GoogleSearch {}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: GoogleSearch::default(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<Value>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().filter_map(Part::as_text).collect())
            .unwrap_or_default()
    }

    pub fn grounding(&self) -> Option<&Value> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parts_serialize_in_wire_shape() {
        let content = Content {
            role: Some("user".to_string()),
            parts: vec![Part::inline("image/png", "AAAA"), Part::text("hi")],
        };
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({
                "role": "user",
                "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"text": "hi"}
                ]
            })
        );
    }

    #[test]
    fn optional_config_blocks_are_omitted() {
        let request = GenerateContentRequest {
            contents: Vec::new(),
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: 0.5,
                thinking_config: None,
            },
            tools: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [], "generationConfig": {"temperature": 0.5}})
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]},
                "groundingMetadata": {"webSearchQueries": ["q"]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Hello");
        assert!(response.grounding().is_some());
    }

    #[test]
    fn unmodelled_parts_keep_sibling_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "Hi"},
                    {"executableCode": {"language": "PYTHON", "code": "print(1)"}},
                    {"text": " there"}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Hi there");
        assert!(matches!(
            response.candidates[0].content.as_ref().unwrap().parts[1],
            Part::Other(_)
        ));
    }

    #[test]
    fn response_without_candidates_has_no_text() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"usageMetadata": {}})).unwrap();
        assert_eq!(response.text(), "");
    }
}
