use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::core::constants::{
    ATTACHMENT_ONLY_TITLE, DEFAULT_NATIVE_MODEL, DEFAULT_TEMPERATURE, MAX_TEMPERATURE,
    MAX_THINKING_BUDGET, NEW_SESSION_TITLE, TITLE_MAX_GRAPHEMES,
};
use crate::core::message::{new_id, Message};

/// The backend a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenRouter => "OpenRouter",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            other => Err(format!(
                "unknown provider '{other}' (expected 'gemini' or 'openrouter')"
            )),
        }
    }
}

/// Generation settings. One global value exists; every session keeps its
/// own copy.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub provider: ProviderKind,
    pub use_search: bool,
    thinking_budget: u32,
    temperature: f32,
    pub openrouter_key: Option<String>,
    pub openrouter_model: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            use_search: false,
            thinking_budget: 0,
            temperature: DEFAULT_TEMPERATURE,
            openrouter_key: None,
            openrouter_model: None,
        }
    }
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for ChatSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSettings")
            .field("provider", &self.provider)
            .field("use_search", &self.use_search)
            .field("thinking_budget", &self.thinking_budget)
            .field("temperature", &self.temperature)
            .field(
                "openrouter_key",
                &self.openrouter_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openrouter_model", &self.openrouter_model)
            .finish()
    }
}

impl ChatSettings {
    pub fn thinking_budget(&self) -> u32 {
        self.thinking_budget
    }

    pub fn set_thinking_budget(&mut self, budget: u32) {
        self.thinking_budget = budget.min(MAX_THINKING_BUDGET);
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature.clamp(0.0, MAX_TEMPERATURE)
        };
    }

    /// Aggregator credential, if one is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.openrouter_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Aggregator model id, if one is set and non-blank.
    pub fn aggregator_model(&self) -> Option<&str> {
        self.openrouter_model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }

    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(provider) = update.provider {
            self.provider = provider;
        }
        if let Some(use_search) = update.use_search {
            self.use_search = use_search;
        }
        if let Some(budget) = update.thinking_budget {
            self.set_thinking_budget(budget);
        }
        if let Some(temperature) = update.temperature {
            self.set_temperature(temperature);
        }
        if let Some(key) = &update.openrouter_key {
            self.openrouter_key = Some(key.clone());
        }
        if let Some(model) = &update.openrouter_model {
            self.openrouter_model = Some(model.clone());
        }
    }
}

/// A partial settings change. Unset fields leave the target untouched.
#[derive(Default, Clone)]
pub struct SettingsUpdate {
    pub provider: Option<ProviderKind>,
    pub use_search: Option<bool>,
    pub thinking_budget: Option<u32>,
    pub temperature: Option<f32>,
    pub openrouter_key: Option<String>,
    pub openrouter_model: Option<String>,
}

impl SettingsUpdate {
    pub fn provider(provider: ProviderKind) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Picking an aggregator model also switches the provider over.
    pub fn openrouter_model(model: impl Into<String>) -> Self {
        Self {
            provider: Some(ProviderKind::OpenRouter),
            openrouter_model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn openrouter_key(key: impl Into<String>) -> Self {
        Self {
            openrouter_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn touches_credential(&self) -> bool {
        self.openrouter_key.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub provider: ProviderKind,
    pub model_id: String,
    pub settings: ChatSettings,
}

impl ChatSession {
    pub fn new(settings: &ChatSettings) -> Self {
        Self::with_model(settings, DEFAULT_NATIVE_MODEL)
    }

    pub fn with_model(settings: &ChatSettings, model_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: NEW_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            provider: settings.provider,
            model_id: model_id.into(),
            settings: settings.clone(),
        }
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Model identifier the next send will use.
    pub fn effective_model(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::Gemini => Some(self.model_id.as_str()),
            ProviderKind::OpenRouter => self.settings.aggregator_model(),
        }
    }
}

/// Title for a session derived from its first user turn: the first 30
/// grapheme clusters after surrounding whitespace is stripped.
pub fn derive_title(text: &str) -> String {
    let truncated: String = text
        .trim()
        .graphemes(true)
        .take(TITLE_MAX_GRAPHEMES)
        .collect();
    if truncated.is_empty() {
        ATTACHMENT_ONLY_TITLE.to_string()
    } else {
        truncated
    }
}
