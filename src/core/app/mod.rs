//! Application state shared by the REPL and the one-shot commands.
//!
//! [`App`] ties the session store, the composer, the stream service and the
//! aggregator catalog together. Front ends feed it user intent and stream
//! updates; it never prints anything itself.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::OpenRouterModel;
use crate::auth::AuthManager;
use crate::core::chat_stream::{ChatStreamService, StreamReceiver};
use crate::core::config::data::Config;
use crate::core::conversation::{Composer, ConversationController};
use crate::core::providers::{ChatBackend, GeminiClient, HttpBackend, OpenRouterClient};
use crate::core::session::{ChatSettings, ProviderKind, SettingsUpdate};
use crate::core::store::SessionStore;
use crate::core::voice::VoiceSession;

pub mod settings;
pub mod streaming;

#[cfg(test)]
mod tests;

/// Startup overrides taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct AppInitConfig {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
}

pub struct App {
    pub store: SessionStore,
    pub composer: Composer,
    pub voice: VoiceSession,
    stream_service: ChatStreamService,
    openrouter: OpenRouterClient,
    auth: AuthManager,
    catalog: Vec<OpenRouterModel>,
    system_instruction: Option<String>,
    /// Cancellation handle per session with a stream in flight.
    stream_tokens: HashMap<String, CancellationToken>,
    persist_preferences: bool,
}

impl App {
    /// Build an app wired to the real backends, with credentials resolved
    /// through `auth` and preferences from `config`.
    pub fn new_with_auth(
        init_config: AppInitConfig,
        config: &Config,
        auth: AuthManager,
    ) -> Result<(App, StreamReceiver), Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder().build()?;
        let gemini = GeminiClient::new(
            client.clone(),
            config.gemini_base_url(),
            auth.resolve(ProviderKind::Gemini),
        );
        if !gemini.has_api_key() {
            tracing::warn!("no Gemini API key found; native sends will fail");
        }
        let openrouter =
            OpenRouterClient::new(client, config.openrouter_base_url(), config.referer());
        let backend = HttpBackend::new(gemini, openrouter.clone());

        let settings = config.chat_settings(auth.resolve(ProviderKind::OpenRouter));
        let (mut app, rx) = App::with_backend(
            settings,
            config.native_model(),
            config.system_instruction().map(str::to_owned),
            Arc::new(backend),
            openrouter,
            auth,
        );
        app.persist_preferences = true;
        app.apply_init_config(init_config);
        Ok((app, rx))
    }

    /// Build an app around an arbitrary backend. Preferences are not
    /// written back to disk.
    pub fn with_backend(
        settings: ChatSettings,
        native_model: &str,
        system_instruction: Option<String>,
        backend: Arc<dyn ChatBackend>,
        openrouter: OpenRouterClient,
        auth: AuthManager,
    ) -> (App, StreamReceiver) {
        let (stream_service, rx) = ChatStreamService::new(backend);
        let mut store = SessionStore::new(settings, native_model);
        store.ensure_session();
        let app = App {
            store,
            composer: Composer::new(),
            voice: VoiceSession::new(),
            stream_service,
            openrouter,
            auth,
            catalog: Vec::new(),
            system_instruction,
            stream_tokens: HashMap::new(),
            persist_preferences: false,
        };
        (app, rx)
    }

    fn apply_init_config(&mut self, init_config: AppInitConfig) {
        let AppInitConfig { provider, model } = init_config;
        if let Some(provider) = provider {
            self.store
                .update_settings(&SettingsUpdate::provider(provider));
        }
        if let Some(model) = model {
            self.set_model_transient(&model);
        }
    }

    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.store, self.system_instruction.as_deref())
    }

    /// Provider of the active session, falling back to the global choice.
    pub fn active_provider(&self) -> ProviderKind {
        self.store
            .active()
            .map(|session| session.provider)
            .unwrap_or(self.store.settings().provider)
    }

    pub fn new_session(&mut self) -> String {
        self.store.create_session()
    }

    /// Select the session at `index` in listing order.
    pub fn select_session(&mut self, index: usize) -> bool {
        let Some(id) = self.store.sessions().get(index).map(|s| s.id.clone()) else {
            return false;
        };
        self.store.select(&id)
    }

    /// Delete the session at `index`, or the active one. Any stream still
    /// writing into it is cancelled.
    pub fn delete_session(&mut self, index: Option<usize>) -> bool {
        let id = match index {
            Some(index) => self.store.sessions().get(index).map(|s| s.id.clone()),
            None => self.store.active_id().map(str::to_owned),
        };
        let Some(id) = id else {
            return false;
        };
        if let Some(token) = self.stream_tokens.remove(&id) {
            token.cancel();
        }
        self.store.delete_session(&id)
    }

    /// Cancel every in-flight stream.
    pub fn shutdown(&mut self) {
        for (_, token) in self.stream_tokens.drain() {
            token.cancel();
        }
        self.voice.close();
    }
}
