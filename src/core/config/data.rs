use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::session::ProviderKind;

/// Persisted preferences. Every field is optional; unset fields fall back
/// to the defaults in [`crate::core::constants`].
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Backend new sessions start on.
    pub provider: Option<ProviderKind>,
    /// OpenRouter model id, e.g. "anthropic/claude-3.5-sonnet".
    pub openrouter_model: Option<String>,
    pub gemini_model: Option<String>,
    pub system_instruction: Option<String>,
    pub use_search: Option<bool>,
    pub thinking_budget: Option<u32>,
    pub temperature: Option<f32>,
    pub gemini_base_url: Option<String>,
    pub openrouter_base_url: Option<String>,
    /// Sent as `HTTP-Referer` on OpenRouter requests.
    pub referer: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
