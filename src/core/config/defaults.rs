use crate::core::config::data::Config;
use crate::core::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_NATIVE_MODEL, DEFAULT_OPENROUTER_BASE_URL, DEFAULT_REFERER,
};
use crate::core::session::{ChatSettings, SettingsUpdate};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn native_model(&self) -> &str {
        non_blank(&self.gemini_model).unwrap_or(DEFAULT_NATIVE_MODEL)
    }

    pub fn gemini_base_url(&self) -> &str {
        non_blank(&self.gemini_base_url).unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }

    pub fn openrouter_base_url(&self) -> &str {
        non_blank(&self.openrouter_base_url).unwrap_or(DEFAULT_OPENROUTER_BASE_URL)
    }

    pub fn referer(&self) -> &str {
        non_blank(&self.referer).unwrap_or(DEFAULT_REFERER)
    }

    pub fn system_instruction(&self) -> Option<&str> {
        non_blank(&self.system_instruction)
    }

    /// Initial global settings: persisted preferences on top of the
    /// defaults, plus the aggregator credential resolved elsewhere.
    pub fn chat_settings(&self, openrouter_key: Option<String>) -> ChatSettings {
        let mut settings = ChatSettings::default();
        settings.apply(&SettingsUpdate {
            provider: self.provider,
            use_search: self.use_search,
            thinking_budget: self.thinking_budget,
            temperature: self.temperature,
            openrouter_key,
            openrouter_model: non_blank(&self.openrouter_model).map(str::to_owned),
        });
        settings
    }

    /// Record the provider and aggregator model choices from `update`.
    /// Generation knobs stay session-only and the credential never lands
    /// in this file.
    pub fn record(&mut self, update: &SettingsUpdate) {
        if let Some(provider) = update.provider {
            self.provider = Some(provider);
        }
        if let Some(model) = &update.openrouter_model {
            self.openrouter_model = Some(model.clone());
        }
    }
}
