use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::api::gemini::Part;
use crate::api::{ChatMessage, ContentPart};
use crate::core::chat_stream::{StreamMessage, StreamParams, StreamTarget};
use crate::core::constants::{AGGREGATOR_IMAGE_PROMPT, NATIVE_ATTACHMENT_PROMPT};
use crate::core::message::{AttachmentKind, ComposerAttachment, Message};
use crate::core::providers::{NativeOptions, NativeTurn, ProviderRequest};
use crate::core::session::{derive_title, ChatSettings, ProviderKind};
use crate::core::store::SessionStore;

const ERROR_PREFIX: &str = "⚠️ Error: ";

/// Text and staged attachments for the next user turn.
#[derive(Debug, Default)]
pub struct Composer {
    text: String,
    attachments: Vec<ComposerAttachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn attachments(&self) -> &[ComposerAttachment] {
        &self.attachments
    }

    pub fn push_attachment(&mut self, attachment: ComposerAttachment) {
        self.attachments.push(attachment);
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<ComposerAttachment> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
    }

    /// Nothing to send: blank text and no attachments.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    fn take(&mut self) -> (String, Vec<ComposerAttachment>) {
        (
            std::mem::take(&mut self.text),
            std::mem::take(&mut self.attachments),
        )
    }
}

/// A send refused before anything was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    MissingCredential,
    MissingModel,
    UnsupportedAttachment { kind: AttachmentKind, name: String },
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionError::MissingCredential => {
                write!(f, "STRICT LOCK: OpenRouter selected but API Key is missing.")
            }
            PreconditionError::MissingModel => write!(
                f,
                "STRICT LOCK: No OpenRouter model selected. Please pick one in Settings."
            ),
            PreconditionError::UnsupportedAttachment { kind, name } => write!(
                f,
                "OpenRouter only accepts image attachments; remove {} attachment '{name}'.",
                kind.as_str()
            ),
        }
    }
}

impl std::error::Error for PreconditionError {}

pub enum SendOutcome {
    /// Nothing to send, or the session is already streaming.
    Ignored,
    Dispatched(StreamParams),
}

pub struct ConversationController<'a> {
    store: &'a mut SessionStore,
    system_instruction: Option<&'a str>,
}

impl<'a> ConversationController<'a> {
    pub fn new(store: &'a mut SessionStore, system_instruction: Option<&'a str>) -> Self {
        Self {
            store,
            system_instruction,
        }
    }

    /// Validate and dispatch the composer contents as a new user turn.
    ///
    /// On a precondition failure neither the session nor the composer is
    /// touched. On dispatch the composer is emptied, the user turn and a
    /// pending assistant turn are appended, and the session is marked in
    /// flight until [`apply`](Self::apply) sees the stream settle.
    pub fn send(
        &mut self,
        session_id: &str,
        composer: &mut Composer,
        cancel_token: CancellationToken,
    ) -> Result<SendOutcome, PreconditionError> {
        if composer.is_empty() || self.store.is_in_flight(session_id) {
            return Ok(SendOutcome::Ignored);
        }
        let Some(provider) = self.store.session(session_id).map(|s| s.provider) else {
            tracing::debug!(session = %session_id, "send to unknown session ignored");
            return Ok(SendOutcome::Ignored);
        };

        let settings = self.store.settings().clone();
        if provider == ProviderKind::OpenRouter {
            check_aggregator_preconditions(&settings, composer.attachments())?;
        }

        let (text, staged) = composer.take();
        let user = Message::user(
            text.clone(),
            staged.iter().map(|a| a.attachment.clone()).collect(),
        );
        let user_id = user.id.clone();
        let placeholder = Message::pending_assistant();
        let target = StreamTarget {
            session_id: session_id.to_string(),
            message_id: placeholder.id.clone(),
        };

        let Some(session) = self.store.session_mut(session_id) else {
            return Ok(SendOutcome::Ignored);
        };
        if session.messages.is_empty() {
            session.title = derive_title(&text);
        }
        session.messages.push(user);

        let request = match provider {
            ProviderKind::Gemini => ProviderRequest::Native {
                turns: native_turns(&session.messages, &user_id, &staged),
                options: NativeOptions {
                    model: session.model_id.clone(),
                    system_instruction: self.system_instruction.map(str::to_owned),
                    use_search: settings.use_search,
                    thinking_budget: settings.thinking_budget(),
                    temperature: settings.temperature(),
                },
            },
            ProviderKind::OpenRouter => ProviderRequest::Aggregator {
                credential: settings.credential().unwrap_or_default().to_string(),
                model: settings.aggregator_model().unwrap_or_default().to_string(),
                messages: aggregator_messages(&session.messages, &user_id, &staged),
            },
        };
        session.messages.push(placeholder);
        self.store.mark_in_flight(session_id, &target.message_id);

        tracing::debug!(
            session = %session_id,
            provider = provider.as_str(),
            model = request.model(),
            turns = request.turn_count(),
            attachments = staged.len(),
            "dispatching send"
        );

        Ok(SendOutcome::Dispatched(StreamParams {
            request,
            target,
            cancel_token,
        }))
    }

    /// Fold one stream message into the turn `target` addresses. Returns
    /// whether anything changed.
    pub fn apply(&mut self, message: StreamMessage, target: &StreamTarget) -> bool {
        let live = self.store.in_flight_message(&target.session_id)
            == Some(target.message_id.as_str());

        let Some(session) = self.store.session_mut(&target.session_id) else {
            tracing::debug!(
                session = %target.session_id,
                "stream update for deleted session dropped"
            );
            return false;
        };
        let Some(turn) = session.message_mut(&target.message_id) else {
            tracing::debug!(
                message = %target.message_id,
                "stream update for unknown message dropped"
            );
            return false;
        };

        match message {
            StreamMessage::Chunk(text) => {
                if !live {
                    return false;
                }
                turn.content.push_str(&text);
                turn.pending = false;
            }
            StreamMessage::Grounding(value) => {
                if !live {
                    return false;
                }
                turn.grounding = Some(value);
            }
            StreamMessage::Error(error) => {
                if !live {
                    return false;
                }
                turn.content = format!("{ERROR_PREFIX}{error}");
                turn.pending = false;
                self.store.settle(&target.session_id, &target.message_id);
            }
            StreamMessage::End => {
                turn.pending = false;
                self.store.settle(&target.session_id, &target.message_id);
            }
        }
        true
    }
}

fn check_aggregator_preconditions(
    settings: &ChatSettings,
    staged: &[ComposerAttachment],
) -> Result<(), PreconditionError> {
    if settings.credential().is_none() {
        return Err(PreconditionError::MissingCredential);
    }
    if settings.aggregator_model().is_none() {
        return Err(PreconditionError::MissingModel);
    }
    if let Some(unsupported) = staged.iter().find(|a| !a.kind().is_image()) {
        return Err(PreconditionError::UnsupportedAttachment {
            kind: unsupported.kind(),
            name: unsupported.attachment.display_name().to_string(),
        });
    }
    Ok(())
}

/// Native turns for `history`. Only the new turn carries attachment
/// payloads; earlier attachments were never retained.
fn native_turns(
    history: &[Message],
    new_turn_id: &str,
    staged: &[ComposerAttachment],
) -> Vec<NativeTurn> {
    history
        .iter()
        .map(|message| {
            let mut parts = Vec::new();
            if message.id == new_turn_id {
                parts.extend(
                    staged
                        .iter()
                        .map(|a| Part::inline(a.attachment.mime_type.clone(), a.data.clone())),
                );
            } else if !message.attachments.is_empty() {
                tracing::debug!(
                    message = %message.id,
                    count = message.attachments.len(),
                    "historical attachments sent without payload"
                );
            }
            let text = if message.content.is_empty() && !message.attachments.is_empty() {
                NATIVE_ATTACHMENT_PROMPT.to_string()
            } else {
                message.content.clone()
            };
            parts.push(Part::text(text));
            NativeTurn {
                role: message.role,
                parts,
            }
        })
        .collect()
}

fn aggregator_messages(
    history: &[Message],
    new_turn_id: &str,
    staged: &[ComposerAttachment],
) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|message| {
            let images: Vec<ContentPart> = if message.id == new_turn_id {
                staged
                    .iter()
                    .filter(|a| a.kind().is_image())
                    .map(|a| ContentPart::inline_image(&a.attachment.mime_type, &a.data))
                    .collect()
            } else {
                if !message.attachments.is_empty() {
                    tracing::debug!(
                        message = %message.id,
                        count = message.attachments.len(),
                        "historical attachments dropped for aggregator"
                    );
                }
                Vec::new()
            };

            if images.is_empty() {
                return ChatMessage::text(message.role.as_str(), message.content.clone());
            }
            let text = if message.content.is_empty() {
                AGGREGATOR_IMAGE_PROMPT.to_string()
            } else {
                message.content.clone()
            };
            let mut parts = vec![ContentPart::text(text)];
            parts.extend(images);
            ChatMessage::parts(message.role.as_str(), parts)
        })
        .collect()
}
