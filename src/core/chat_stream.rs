use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::providers::{ChatBackend, ProviderRequest, StreamDelta};

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Grounding(Value),
    Error(String),
    End,
}

/// Addresses the assistant turn a stream writes into.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub session_id: String,
    pub message_id: String,
}

pub struct StreamParams {
    pub request: ProviderRequest,
    pub target: StreamTarget,
    pub cancel_token: CancellationToken,
}

pub type StreamReceiver = mpsc::UnboundedReceiver<(StreamMessage, StreamTarget)>;

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, StreamTarget)>,
    backend: Arc<dyn ChatBackend>,
}

impl ChatStreamService {
    pub fn new(backend: Arc<dyn ChatBackend>) -> (Self, StreamReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, backend }, rx)
    }

    /// Run one request on its own task. Every stream that is not cancelled
    /// finishes with exactly one `End`, preceded by `Error` on failure.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            let StreamParams {
                request,
                target,
                cancel_token,
            } = params;
            let provider = request.provider();

            tokio::select! {
                result = async {
                    let mut sink = |delta: StreamDelta| {
                        let message = match delta {
                            StreamDelta::Text(text) => StreamMessage::Chunk(text),
                            StreamDelta::Grounding(value) => StreamMessage::Grounding(value),
                        };
                        let _ = tx.send((message, target.clone()));
                    };
                    backend.stream(request, &mut sink).await
                } => {
                    if let Err(err) = result {
                        tracing::debug!(
                            provider = provider.as_str(),
                            session = %target.session_id,
                            error = %err,
                            "stream failed"
                        );
                        let _ = tx.send((StreamMessage::Error(err.to_string()), target.clone()));
                    }
                    let _ = tx.send((StreamMessage::End, target));
                }
                _ = cancel_token.cancelled() => {
                    tracing::debug!(session = %target.session_id, "stream cancelled");
                }
            }
        });
    }
}
