//! Provider adapters and the backend seam used by the stream service.
//!
//! Each adapter translates the internal message model into its backend's
//! request shape and hands incremental text back to the caller. The
//! [`ChatBackend`] trait lets the stream service drive either adapter (or a
//! test double) through one entry point.

pub mod gemini;
pub mod openrouter;

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::api::ChatMessage;
use crate::core::session::ProviderKind;

pub use gemini::{GeminiClient, NativeFragment, NativeOptions, NativeTurn};
pub use openrouter::OpenRouterClient;

#[derive(Debug)]
pub enum ProviderError {
    /// Aggregator call attempted with a blank model id.
    MissingModel,
    /// No API key available for the backend.
    MissingApiKey(ProviderKind),
    /// The request could not be sent or the connection failed.
    Http {
        provider: ProviderKind,
        source: reqwest::Error,
    },
    /// The backend answered with a non-success status.
    Status {
        provider: ProviderKind,
        status: StatusCode,
        message: String,
    },
    /// Reading the streamed body failed part way through.
    Body {
        provider: ProviderKind,
        source: reqwest::Error,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::MissingModel => write!(
                f,
                "No OpenRouter model ID specified. Please enter a model in Settings."
            ),
            ProviderError::MissingApiKey(provider) => {
                write!(f, "No {} API key configured.", provider.display_name())
            }
            ProviderError::Http { provider, source } => write!(
                f,
                "Failed to connect to {}: {source}",
                provider.display_name()
            ),
            ProviderError::Status {
                provider, message, ..
            } => write!(f, "{} Error: {message}", provider.display_name()),
            ProviderError::Body { provider, source } => write!(
                f,
                "{} stream interrupted: {source}",
                provider.display_name()
            ),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProviderError::Http { source, .. } | ProviderError::Body { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Everything one send needs, already shaped for its backend.
pub enum ProviderRequest {
    Native {
        turns: Vec<NativeTurn>,
        options: NativeOptions,
    },
    Aggregator {
        credential: String,
        model: String,
        messages: Vec<ChatMessage>,
    },
}

impl ProviderRequest {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderRequest::Native { .. } => ProviderKind::Gemini,
            ProviderRequest::Aggregator { .. } => ProviderKind::OpenRouter,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderRequest::Native { options, .. } => &options.model,
            ProviderRequest::Aggregator { model, .. } => model,
        }
    }

    pub fn turn_count(&self) -> usize {
        match self {
            ProviderRequest::Native { turns, .. } => turns.len(),
            ProviderRequest::Aggregator { messages, .. } => messages.len(),
        }
    }
}

/// Incremental output produced while a request streams.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDelta {
    Text(String),
    Grounding(Value),
}

pub type DeltaSink<'a> = dyn FnMut(StreamDelta) + Send + 'a;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Drive `request` to completion, feeding output to `sink` in arrival
    /// order. Returns once the backend closes the stream.
    async fn stream(
        &self,
        request: ProviderRequest,
        sink: &mut DeltaSink<'_>,
    ) -> Result<(), ProviderError>;
}

/// The real backends, reached over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    pub gemini: GeminiClient,
    pub openrouter: OpenRouterClient,
}

impl HttpBackend {
    pub fn new(gemini: GeminiClient, openrouter: OpenRouterClient) -> Self {
        Self { gemini, openrouter }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn stream(
        &self,
        request: ProviderRequest,
        sink: &mut DeltaSink<'_>,
    ) -> Result<(), ProviderError> {
        match request {
            ProviderRequest::Native { turns, options } => {
                use futures_util::StreamExt;

                let mut fragments = self.gemini.stream(&turns, &options).await?;
                while let Some(fragment) = fragments.next().await {
                    let NativeFragment { text, grounding } = fragment?;
                    if !text.is_empty() {
                        sink(StreamDelta::Text(text));
                    }
                    if let Some(grounding) = grounding {
                        sink(StreamDelta::Grounding(grounding));
                    }
                }
                Ok(())
            }
            ProviderRequest::Aggregator {
                credential,
                model,
                messages,
            } => {
                self.openrouter
                    .stream(&credential, &model, &messages, |delta| {
                        sink(StreamDelta::Text(delta.to_string()))
                    })
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_are_prefixed_with_provider() {
        let err = ProviderError::Status {
            provider: ProviderKind::OpenRouter,
            status: StatusCode::UNAUTHORIZED,
            message: "User not found.".to_string(),
        };
        assert_eq!(err.to_string(), "OpenRouter Error: User not found.");
    }

    #[test]
    fn missing_model_message_points_to_settings() {
        assert_eq!(
            ProviderError::MissingModel.to_string(),
            "No OpenRouter model ID specified. Please enter a model in Settings."
        );
    }

    #[test]
    fn request_reports_provider_and_model() {
        let request = ProviderRequest::Aggregator {
            credential: "key".to_string(),
            model: "vendor/model-x".to_string(),
            messages: vec![ChatMessage::text("user", "hi")],
        };
        assert_eq!(request.provider(), ProviderKind::OpenRouter);
        assert_eq!(request.model(), "vendor/model-x");
        assert_eq!(request.turn_count(), 1);
    }
}
