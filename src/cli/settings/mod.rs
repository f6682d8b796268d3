//! Settings management for CLI set/unset commands.
//!
//! Each preference key has a [`SettingHandler`]; handlers come in a few
//! shapes:
//!
//! - Provider choice (`provider`)
//! - Boolean settings (`use-search`)
//! - Numeric settings with a range (`thinking-budget`, `temperature`)
//! - Free-form strings (`openrouter-model`, `system-instruction`, base URLs)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::data::{path_display, Config};

/// Trait for handling a configuration setting.
///
/// Each implementation handles a specific configuration key,
/// providing set, unset, and format operations.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words after the key. Returns
    /// the success message to display.
    fn set(&self, args: &[String]) -> Result<String, SettingError>;

    /// Clear the configuration value so the default applies again.
    fn unset(&self) -> Result<String, SettingError>;

    /// Format the current value for display in `nexus set` output.
    fn format(&self, config: &Config) -> String;
}

/// Print every setting with its current value.
pub fn print_all(registry: &SettingRegistry, config: &Config) {
    println!("⚙️  Nexus settings ({})", path_display(Config::active_path()));
    for key in registry.keys_display_order() {
        if let Some(handler) = registry.get(key) {
            println!("{}", handler.format(config));
        }
    }
}
