use futures_util::{Stream, StreamExt};

use super::ProviderError;
use crate::api::models::fetch_models;
use crate::api::{ChatMessage, ChatRequest, ChatResponse, ErrorBody, OpenRouterModel};
use crate::core::session::ProviderKind;
use crate::core::sse::{extract_deltas, LineDecoder};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

const CONNECT_FAILURE: &str = "Failed to connect to OpenRouter";

#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
    referer: String,
}

impl OpenRouterClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        referer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            referer: referer.into(),
        }
    }

    /// Fetch the model catalog. Any failure yields an empty list.
    pub async fn list_models(&self, credential: &str) -> Vec<OpenRouterModel> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Vec::new();
        }

        match fetch_models(&self.client, &self.base_url, credential, &self.referer).await {
            Ok(models) => {
                tracing::debug!(count = models.len(), "fetched openrouter catalog");
                models
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch openrouter catalog");
                Vec::new()
            }
        }
    }

    /// Stream a chat completion, calling `on_delta` for every non-empty
    /// content delta in arrival order. Returns once the body ends.
    pub async fn stream<F>(
        &self,
        credential: &str,
        model_id: &str,
        messages: &[ChatMessage],
        on_delta: F,
    ) -> Result<(), ProviderError>
    where
        F: FnMut(&str),
    {
        let model = model_id.trim();
        if model.is_empty() {
            return Err(ProviderError::MissingModel);
        }
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(ProviderError::MissingApiKey(ProviderKind::OpenRouter));
        }

        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            stream: true,
        };
        let url = construct_api_url(&self.base_url, "chat/completions");
        tracing::debug!(model, messages = messages.len(), "opening openrouter stream");

        let http_request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        let http_request = add_auth_headers(http_request, credential, &self.referer);

        let response = http_request
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Http {
                provider: ProviderKind::OpenRouter,
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: ProviderKind::OpenRouter,
                status,
                message: aggregator_error_message(&error_text),
            });
        }

        pump_deltas(response.bytes_stream(), on_delta).await
    }
}

/// Feed every content delta in `body` to `on_delta`, chunk by chunk.
pub async fn pump_deltas<S, B, F>(mut body: S, mut on_delta: F) -> Result<(), ProviderError>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
    F: FnMut(&str),
{
    let mut decoder = LineDecoder::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| ProviderError::Body {
            provider: ProviderKind::OpenRouter,
            source,
        })?;
        let lines = decoder.push(chunk.as_ref());
        for delta in extract_deltas(&lines, ChatResponse::into_delta) {
            on_delta(&delta);
        }
    }
    if let Some(tail) = decoder.finish() {
        for delta in extract_deltas(&[tail], ChatResponse::into_delta) {
            on_delta(&delta);
        }
    }
    Ok(())
}

fn aggregator_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.summary())
        .unwrap_or_else(|| CONNECT_FAILURE.to_string())
}
