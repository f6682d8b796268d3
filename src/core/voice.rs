//! Voice session placeholder. Opening one only walks through the connection
//! states; no audio is captured or sent.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::session::ProviderKind;

pub const CONNECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Closed,
    Connecting,
    Listening,
}

impl VoiceState {
    pub fn label(self) -> &'static str {
        match self {
            VoiceState::Closed => "closed",
            VoiceState::Connecting => "Connecting...",
            VoiceState::Listening => "Listening...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceUnavailable(pub ProviderKind);

impl fmt::Display for VoiceUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Voice is not available with {}.", self.0.display_name())
    }
}

impl std::error::Error for VoiceUnavailable {}

#[derive(Debug, Default)]
pub struct VoiceSession {
    opened_at: Option<Instant>,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a voice session. Only the native backend offers one.
    pub fn open(&mut self, provider: ProviderKind) -> Result<VoiceState, VoiceUnavailable> {
        if provider != ProviderKind::Gemini {
            return Err(VoiceUnavailable(provider));
        }
        if self.opened_at.is_none() {
            self.opened_at = Some(Instant::now());
            tracing::debug!("voice session opened");
        }
        Ok(self.state())
    }

    pub fn close(&mut self) {
        if self.opened_at.take().is_some() {
            tracing::debug!("voice session closed");
        }
    }

    pub fn state(&self) -> VoiceState {
        match self.opened_at {
            None => VoiceState::Closed,
            Some(opened) if opened.elapsed() < CONNECT_DELAY => VoiceState::Connecting,
            Some(_) => VoiceState::Listening,
        }
    }

    /// When an open session starts listening.
    pub fn ready_at(&self) -> Option<Instant> {
        self.opened_at.map(|opened| opened + CONNECT_DELAY)
    }
}
