use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;

use super::ProviderError;
use crate::api::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    ThinkingConfig, Tool,
};
use crate::core::constants::{DEFAULT_SYSTEM_INSTRUCTION, EMPTY_TURN_PLACEHOLDER};
use crate::core::message::Role;
use crate::core::session::ProviderKind;
use crate::core::sse::{extract_records, LineDecoder};
use crate::utils::auth::add_gemini_key;
use crate::utils::url::construct_api_url;

/// One conversation turn in native form.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeOptions {
    pub model: String,
    pub system_instruction: Option<String>,
    pub use_search: bool,
    /// Zero disables extended reasoning.
    pub thinking_budget: u32,
    pub temperature: f32,
}

/// A piece of streamed output. `text` may be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeFragment {
    pub text: String,
    pub grounding: Option<Value>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Open a streaming generation call.
    ///
    /// Connection and status failures are reported here, before any
    /// fragment is produced. The returned stream ends when the backend
    /// closes the body and cannot be restarted.
    pub async fn stream(
        &self,
        turns: &[NativeTurn],
        options: &NativeOptions,
    ) -> Result<BoxStream<'static, Result<NativeFragment, ProviderError>>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey(ProviderKind::Gemini))?;

        let body = build_request(turns, options);
        let url = construct_api_url(
            &self.base_url,
            &format!("models/{}:streamGenerateContent?alt=sse", options.model),
        );
        tracing::debug!(model = %options.model, turns = turns.len(), "opening gemini stream");

        let request = add_gemini_key(self.client.post(url), api_key)
            .header("Content-Type", "application/json")
            .json(&body);

        let response = request.send().await.map_err(|source| ProviderError::Http {
            provider: ProviderKind::Gemini,
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::Gemini,
                status,
                message: gemini_error_message(&error_text),
            });
        }

        Ok(fragments(response.bytes_stream()).boxed())
    }
}

/// Shape turns and options into a `streamGenerateContent` body.
pub fn build_request(turns: &[NativeTurn], options: &NativeOptions) -> GenerateContentRequest {
    let contents = turns
        .iter()
        .map(|turn| {
            let mut parts: Vec<Part> = turn
                .parts
                .iter()
                .filter(|part| !part.is_empty_text())
                .cloned()
                .collect();
            if parts.is_empty() {
                parts.push(Part::text(EMPTY_TURN_PLACEHOLDER));
            }
            Content {
                role: Some(native_role(turn.role).to_string()),
                parts,
            }
        })
        .collect();

    let instruction = options
        .system_instruction
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION);

    GenerateContentRequest {
        contents,
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(instruction)],
        }),
        generation_config: GenerationConfig {
            temperature: options.temperature,
            thinking_config: (options.thinking_budget > 0).then(|| ThinkingConfig {
                thinking_budget: options.thinking_budget,
            }),
        },
        tools: options.use_search.then(|| vec![Tool::google_search()]),
    }
}

fn native_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::System => "user",
    }
}

fn gemini_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "request failed".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

struct FragmentState<S> {
    body: S,
    decoder: LineDecoder,
    ready: VecDeque<NativeFragment>,
    finished: bool,
}

impl<S> FragmentState<S> {
    fn enqueue(&mut self, lines: &[String]) {
        let fragments = extract_records::<GenerateContentResponse, _, _>(lines, |response| {
            let fragment = NativeFragment {
                text: response.text(),
                grounding: response.grounding().cloned(),
            };
            (!fragment.text.is_empty() || fragment.grounding.is_some()).then_some(fragment)
        });
        self.ready.extend(fragments);
    }
}

/// Turn a response body into a lazy fragment stream.
pub fn fragments<S, B>(body: S) -> impl Stream<Item = Result<NativeFragment, ProviderError>>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin + Send + 'static,
    B: AsRef<[u8]>,
{
    let state = FragmentState {
        body,
        decoder: LineDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.ready.pop_front() {
                return Some((Ok(fragment), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.push(chunk.as_ref());
                    state.enqueue(&lines);
                }
                Some(Err(source)) => {
                    state.finished = true;
                    return Some((
                        Err(ProviderError::Body {
                            provider: ProviderKind::Gemini,
                            source,
                        }),
                        state,
                    ));
                }
                None => {
                    state.finished = true;
                    if let Some(tail) = state.decoder.finish() {
                        state.enqueue(&[tail]);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> NativeOptions {
        NativeOptions {
            model: "gemini-3-pro-preview".to_string(),
            system_instruction: None,
            use_search: false,
            thinking_budget: 0,
            temperature: 0.7,
        }
    }

    #[test]
    fn assistant_turns_use_model_role() {
        let turns = vec![
            NativeTurn {
                role: Role::User,
                parts: vec![Part::text("hi")],
            },
            NativeTurn {
                role: Role::Assistant,
                parts: vec![Part::text("hello")],
            },
        ];
        let request = build_request(&turns, &options());
        let roles: Vec<_> = request
            .contents
            .iter()
            .map(|c| c.role.as_deref().unwrap_or_default())
            .collect();
        assert_eq!(roles, vec!["user", "model"]);
    }

    #[test]
    fn empty_turns_get_placeholder_part() {
        let turns = vec![NativeTurn {
            role: Role::Assistant,
            parts: vec![Part::text("")],
        }];
        let request = build_request(&turns, &options());
        assert_eq!(request.contents[0].parts, vec![Part::text("...")]);
    }

    #[test]
    fn inline_parts_survive_empty_text_filtering() {
        let turns = vec![NativeTurn {
            role: Role::User,
            parts: vec![Part::inline("image/png", "AAAA"), Part::text("")],
        }];
        let request = build_request(&turns, &options());
        assert_eq!(
            request.contents[0].parts,
            vec![Part::inline("image/png", "AAAA")]
        );
    }

    #[test]
    fn search_and_thinking_only_when_enabled() {
        let request = build_request(&[], &options());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.pointer("/generationConfig/thinkingConfig").is_none());
        assert_eq!(
            value.pointer("/systemInstruction/parts/0/text"),
            Some(&json!(DEFAULT_SYSTEM_INSTRUCTION))
        );

        let enabled = NativeOptions {
            use_search: true,
            thinking_budget: 2048,
            system_instruction: Some("Be brief.".to_string()),
            ..options()
        };
        let value = serde_json::to_value(build_request(&[], &enabled)).unwrap();
        assert_eq!(value["tools"], json!([{"googleSearch": {}}]));
        assert_eq!(
            value.pointer("/generationConfig/thinkingConfig/thinkingBudget"),
            Some(&json!(2048))
        );
        assert_eq!(
            value.pointer("/systemInstruction/parts/0/text"),
            Some(&json!("Be brief."))
        );
    }

    #[test]
    fn error_message_prefers_structured_body() {
        assert_eq!(
            gemini_error_message(r#"{"error":{"code":400,"message":"API key not valid."}}"#),
            "API key not valid."
        );
        assert_eq!(gemini_error_message("  "), "request failed");
        assert_eq!(gemini_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn fragments_follow_chunk_order_and_skip_noise() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel".to_vec()),
            Ok(b"\"}]}}]}\r\n\r\ndata: not-json\r\n".to_vec()),
            Ok(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]}}]}".to_vec()),
        ];
        let collected: Vec<_> = fragments(stream::iter(chunks)).collect().await;
        let texts: Vec<_> = collected
            .into_iter()
            .map(|fragment| fragment.map(|f| f.text).unwrap_or_default())
            .collect();
        assert_eq!(texts, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn text_survives_unrecognised_sibling_parts() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(
            b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"},{\"executableCode\":{\"language\":\"PYTHON\",\"code\":\"print(1)\"}}]}}]}\n"
                .to_vec(),
        )];
        let collected: Vec<_> = fragments(stream::iter(chunks)).collect().await;
        assert_eq!(collected.len(), 1);
        let fragment = collected.into_iter().next().unwrap().unwrap();
        assert_eq!(fragment.text, "Hi");
    }

    #[tokio::test]
    async fn grounding_metadata_is_forwarded() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(
            b"data: {\"candidates\":[{\"groundingMetadata\":{\"webSearchQueries\":[\"rust\"]}}]}\n"
                .to_vec(),
        )];
        let collected: Vec<_> = fragments(stream::iter(chunks)).collect().await;
        assert_eq!(collected.len(), 1);
        let fragment = collected.into_iter().next().unwrap().unwrap();
        assert!(fragment.text.is_empty());
        assert_eq!(
            fragment.grounding,
            Some(json!({"webSearchQueries": ["rust"]}))
        );
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let client = GeminiClient::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let result = client.stream(&[], &options()).await;
        assert!(matches!(
            result,
            Err(ProviderError::MissingApiKey(ProviderKind::Gemini))
        ));
    }
}
