//! API credentials: the OS keyring first, then environment variables.

use crate::core::keyring::KeyringAccessError;
use crate::core::session::ProviderKind;
use keyring::Entry;

const KEYRING_SERVICE: &str = "nexus";

/// Keyring user name a provider's credential is stored under.
pub fn keyring_user(provider: ProviderKind) -> &'static str {
    provider.as_str()
}

/// Environment variables consulted for `provider`, in order.
pub fn env_vars(provider: ProviderKind) -> &'static [&'static str] {
    match provider {
        ProviderKind::Gemini => &["GEMINI_API_KEY", "API_KEY"],
        ProviderKind::OpenRouter => &["OPENROUTER_API_KEY"],
    }
}

fn env_token(provider: ProviderKind) -> Option<String> {
    env_vars(provider).iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

pub struct AuthManager {
    use_keyring: bool,
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    pub fn store_token(
        &self,
        provider: ProviderKind,
        token: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let token = token.trim();
        if token.is_empty() {
            return Err("Token cannot be empty".into());
        }
        if !self.use_keyring {
            return Ok(());
        }
        let entry = Entry::new(KEYRING_SERVICE, keyring_user(provider))
            .map_err(KeyringAccessError::from)?;
        entry
            .set_password(token)
            .map_err(KeyringAccessError::from)?;
        tracing::debug!(provider = provider.as_str(), "stored credential in keyring");
        Ok(())
    }

    pub fn get_token(&self, provider: ProviderKind) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        let entry = Entry::new(KEYRING_SERVICE, keyring_user(provider))?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the stored credential. Returns whether one existed.
    pub fn remove_token(&self, provider: ProviderKind) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        let entry = Entry::new(KEYRING_SERVICE, keyring_user(provider))?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// The credential to use for `provider`: the keyring entry when present,
    /// otherwise the first non-empty environment variable. Keyring failures
    /// are logged and fall through to the environment.
    pub fn resolve(&self, provider: ProviderKind) -> Option<String> {
        match self.get_token(provider) {
            Ok(Some(token)) if !token.trim().is_empty() => return Some(token.trim().to_string()),
            Ok(_) => {}
            Err(err) => tracing::warn!(
                provider = provider.as_str(),
                recoverable = err.is_recoverable(),
                error = %err,
                "keyring lookup failed"
            ),
        }
        let token = env_token(provider);
        if token.is_some() {
            tracing::debug!(provider = provider.as_str(), "using credential from environment");
        }
        token
    }
}
