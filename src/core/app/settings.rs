use super::App;
use crate::api::models::filter_models;
use crate::api::OpenRouterModel;
use crate::core::config::data::Config;
use crate::core::session::{ProviderKind, SettingsUpdate};
use crate::core::voice::{VoiceState, VoiceUnavailable};

impl App {
    /// Apply a settings change to the global settings and the active
    /// session, persisting the provider and model choice and storing a new
    /// credential in the keyring. Returns whether the catalog should be
    /// refetched.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> bool {
        self.store.update_settings(&update);

        if self.persist_preferences {
            if let Err(err) = Config::mutate(|config| {
                config.record(&update);
                Ok(())
            }) {
                tracing::warn!(error = %err, "failed to save preferences");
            }
            if let Some(key) = &update.openrouter_key {
                if let Err(err) = self.auth.store_token(ProviderKind::OpenRouter, key) {
                    tracing::warn!(error = %err, "failed to store OpenRouter key");
                }
            }
        }

        update.touches_credential()
    }

    /// Switch the model for the active session's provider. Aggregator
    /// choices go through [`update_settings`](Self::update_settings); a
    /// native model only applies to the active session.
    pub fn set_model(&mut self, model: &str) -> bool {
        let model = model.trim();
        if model.is_empty() {
            return false;
        }
        match self.active_provider() {
            ProviderKind::OpenRouter => {
                self.update_settings(SettingsUpdate::openrouter_model(model));
            }
            ProviderKind::Gemini => {
                if let Some(session) = self.store.active_mut() {
                    session.model_id = model.to_string();
                }
            }
        }
        true
    }

    pub(super) fn set_model_transient(&mut self, model: &str) {
        let model = model.trim();
        if model.is_empty() {
            return;
        }
        match self.active_provider() {
            ProviderKind::OpenRouter => self
                .store
                .update_settings(&SettingsUpdate::openrouter_model(model)),
            ProviderKind::Gemini => {
                if let Some(session) = self.store.active_mut() {
                    session.model_id = model.to_string();
                }
            }
        }
    }

    /// Refetch the aggregator catalog with the current credential. Returns
    /// the number of models now known.
    pub async fn refresh_catalog(&mut self) -> usize {
        let credential = self
            .store
            .settings()
            .credential()
            .unwrap_or_default()
            .to_string();
        self.catalog = self.openrouter.list_models(&credential).await;
        self.catalog.len()
    }

    pub fn catalog(&self) -> &[OpenRouterModel] {
        &self.catalog
    }

    pub fn search_catalog(&self, query: &str) -> Vec<&OpenRouterModel> {
        filter_models(&self.catalog, query)
    }

    /// Open a voice session when none is open, otherwise close it.
    pub fn toggle_voice(&mut self) -> Result<VoiceState, VoiceUnavailable> {
        if self.voice.state() == VoiceState::Closed {
            self.voice.open(self.active_provider())
        } else {
            self.voice.close();
            Ok(VoiceState::Closed)
        }
    }
}
