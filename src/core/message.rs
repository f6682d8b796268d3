use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Coarse media classification of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Document,
}

impl AttachmentKind {
    /// Classify a declared content type. Anything that is not image, video
    /// or audio is treated as a document.
    pub fn from_mime(mime_type: &str) -> Self {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if mime_type.starts_with("image/") {
            AttachmentKind::Image
        } else if mime_type.starts_with("video/") {
            AttachmentKind::Video
        } else if mime_type.starts_with("audio/") {
            AttachmentKind::Audio
        } else {
            AttachmentKind::Document
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Document => "document",
        }
    }

    pub fn is_image(self) -> bool {
        self == AttachmentKind::Image
    }
}

/// Attachment reference kept in the transcript. The raw payload is not part
/// of this type; see [`ComposerAttachment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    kind: AttachmentKind,
    pub locator: String,
    pub mime_type: String,
    pub name: Option<String>,
}

impl Attachment {
    pub fn new(
        locator: impl Into<String>,
        mime_type: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        let mime_type = mime_type.into();
        Self {
            kind: AttachmentKind::from_mime(&mime_type),
            locator: locator.into(),
            mime_type,
            name,
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.locator)
    }
}

/// An attachment staged in the composer together with its base64 payload.
///
/// The payload is consumed when the message is sent; only the
/// [`Attachment`] half is retained in the session.
#[derive(Debug, Clone)]
pub struct ComposerAttachment {
    pub attachment: Attachment,
    pub data: String,
}

impl ComposerAttachment {
    pub fn new(attachment: Attachment, data: impl Into<String>) -> Self {
        Self {
            attachment,
            data: data.into(),
        }
    }

    pub fn kind(&self) -> AttachmentKind {
        self.attachment.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Set on an assistant turn whose content is still streaming in.
    #[serde(default)]
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding: Option<serde_json::Value>,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            pending: false,
            grounding: None,
        }
    }

    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            attachments,
            ..Self::new(Role::User, content)
        }
    }

    /// Placeholder assistant turn awaiting its first delta.
    pub fn pending_assistant() -> Self {
        Self {
            pending: true,
            ..Self::new(Role::Assistant, String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_kind_follows_declared_mime() {
        assert_eq!(AttachmentKind::from_mime("image/png"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_mime("VIDEO/mp4"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_mime("audio/ogg"), AttachmentKind::Audio);
        assert_eq!(
            AttachmentKind::from_mime("application/pdf"),
            AttachmentKind::Document
        );
        assert_eq!(AttachmentKind::from_mime(""), AttachmentKind::Document);
    }

    #[test]
    fn attachment_kind_is_fixed_at_capture() {
        let mut attachment = Attachment::new("cat.png", "image/png", None);
        attachment.mime_type = "application/octet-stream".to_string();
        assert_eq!(attachment.kind(), AttachmentKind::Image);
    }

    #[test]
    fn pending_assistant_starts_empty() {
        let message = Message::pending_assistant();
        assert!(message.pending);
        assert_eq!(message.role, Role::Assistant);
        assert!(message.content.is_empty());
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("model").is_err());
        assert_eq!(Role::try_from("system"), Ok(Role::System));
    }

    #[test]
    fn message_ids_are_unique() {
        let a = Message::new(Role::User, "a");
        let b = Message::new(Role::User, "a");
        assert_ne!(a.id, b.id);
    }
}
