//! In-memory session registry.
//!
//! Owns every [`ChatSession`], the active selection, the global settings
//! value, and the set of sessions with a send in flight.

use std::collections::HashMap;

use crate::core::constants::DEFAULT_NATIVE_MODEL;
use crate::core::session::{ChatSession, ChatSettings, SettingsUpdate};

#[derive(Debug)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
    settings: ChatSettings,
    native_model: String,
    /// session id -> assistant message id being streamed.
    in_flight: HashMap<String, String>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(ChatSettings::default(), DEFAULT_NATIVE_MODEL)
    }
}

impl SessionStore {
    pub fn new(settings: ChatSettings, native_model: impl Into<String>) -> Self {
        Self {
            sessions: Vec::new(),
            active_id: None,
            settings,
            native_model: native_model.into(),
            in_flight: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Create the first session when the store is empty.
    pub fn ensure_session(&mut self) -> &str {
        if self.sessions.is_empty() {
            self.create_session();
        }
        if self.active_id.is_none() {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }
        self.active_id.as_deref().unwrap_or_default()
    }

    /// Prepend a fresh session seeded from the global settings and make it
    /// active.
    pub fn create_session(&mut self) -> String {
        let session = ChatSession::with_model(&self.settings, self.native_model.clone());
        let id = session.id.clone();
        tracing::debug!(session = %id, provider = session.provider.as_str(), "created session");
        self.sessions.insert(0, session);
        self.active_id = Some(id.clone());
        id
    }

    /// Remove a session. When it was active, the first remaining session
    /// becomes active, or none.
    pub fn delete_session(&mut self, session_id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        if self.sessions.len() == before {
            return false;
        }
        self.in_flight.remove(session_id);
        if self.active_id.as_deref() == Some(session_id) {
            self.active_id = self.sessions.first().map(|s| s.id.clone());
        }
        tracing::debug!(session = %session_id, "deleted session");
        true
    }

    pub fn select(&mut self, session_id: &str) -> bool {
        if self.session(session_id).is_some() {
            self.active_id = Some(session_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn session_mut(&mut self, session_id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    pub fn active(&self) -> Option<&ChatSession> {
        self.active_id.as_deref().and_then(|id| self.session(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut ChatSession> {
        let id = self.active_id.clone()?;
        self.session_mut(&id)
    }

    /// Merge `update` into the global settings, then into the active
    /// session's copy, which also adopts the resulting provider. Other
    /// sessions keep their snapshots.
    pub fn update_settings(&mut self, update: &SettingsUpdate) {
        self.settings.apply(update);
        let provider = self.settings.provider;
        if let Some(session) = self.active_mut() {
            session.settings.apply(update);
            session.provider = provider;
        }
    }

    pub fn mark_in_flight(&mut self, session_id: &str, message_id: &str) {
        self.in_flight
            .insert(session_id.to_string(), message_id.to_string());
    }

    /// Drop the in-flight mark for `session_id` if it still points at
    /// `message_id`.
    pub fn settle(&mut self, session_id: &str, message_id: &str) {
        if self.in_flight.get(session_id).map(String::as_str) == Some(message_id) {
            self.in_flight.remove(session_id);
        }
    }

    pub fn is_in_flight(&self, session_id: &str) -> bool {
        self.in_flight.contains_key(session_id)
    }

    pub fn in_flight_message(&self, session_id: &str) -> Option<&str> {
        self.in_flight.get(session_id).map(String::as_str)
    }

    pub fn is_sending(&self) -> bool {
        !self.in_flight.is_empty()
    }
}
