use tokio_util::sync::CancellationToken;

use super::App;
use crate::core::chat_stream::{StreamMessage, StreamTarget};
use crate::core::conversation::{ConversationController, PreconditionError, SendOutcome};

impl App {
    /// Send the composer contents as a new turn on the active session.
    ///
    /// Returns the target the resulting stream writes into, or `None` when
    /// there was nothing to send or the session is still streaming.
    pub fn send(&mut self) -> Result<Option<StreamTarget>, PreconditionError> {
        let session_id = self.store.ensure_session().to_string();
        let cancel_token = CancellationToken::new();
        let outcome = ConversationController::new(
            &mut self.store,
            self.system_instruction.as_deref(),
        )
        .send(&session_id, &mut self.composer, cancel_token.clone())?;

        match outcome {
            SendOutcome::Ignored => Ok(None),
            SendOutcome::Dispatched(params) => {
                let target = params.target.clone();
                self.stream_tokens.insert(session_id, cancel_token);
                self.stream_service.spawn_stream(params);
                Ok(Some(target))
            }
        }
    }

    /// Fold a stream update into its session. Returns whether the
    /// transcript changed.
    pub fn handle_stream_message(&mut self, message: StreamMessage, target: &StreamTarget) -> bool {
        let changed = self.conversation().apply(message, target);
        if !self.store.is_in_flight(&target.session_id) {
            self.stream_tokens.remove(&target.session_id);
        }
        changed
    }

    pub fn is_streaming(&self) -> bool {
        self.store.is_sending()
    }

    /// Cancel the stream writing into the active session, leaving whatever
    /// text already arrived.
    pub fn cancel_active_stream(&mut self) -> bool {
        let Some(session_id) = self.store.active_id().map(str::to_owned) else {
            return false;
        };
        let Some(token) = self.stream_tokens.remove(&session_id) else {
            return false;
        };
        token.cancel();
        if let Some(message_id) = self.store.in_flight_message(&session_id).map(str::to_owned) {
            let target = StreamTarget {
                session_id,
                message_id,
            };
            self.conversation().apply(StreamMessage::End, &target);
        }
        true
    }
}
