//! Shared constants used across the application

pub const DEFAULT_NATIVE_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a multimodal expert. Analyze files and text with precision.";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Attribution headers sent with every aggregator request.
pub const DEFAULT_REFERER: &str = "https://github.com/nexus-chat/nexus";
pub const APP_TITLE: &str = "Nexus AI Pro";

pub const NEW_SESSION_TITLE: &str = "New Chat";
pub const ATTACHMENT_ONLY_TITLE: &str = "Attachment Analysis";
pub const TITLE_MAX_GRAPHEMES: usize = 30;

pub const MAX_THINKING_BUDGET: u32 = 32_768;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Text used for a user turn whose only content is attachments.
pub const NATIVE_ATTACHMENT_PROMPT: &str = "Analyze the provided files.";
pub const AGGREGATOR_IMAGE_PROMPT: &str = "Describe these images.";
/// Stand-in part for a native turn that would otherwise have no parts.
pub const EMPTY_TURN_PLACEHOLDER: &str = "...";

pub const CATALOG_PREVIEW_LIMIT: usize = 50;
