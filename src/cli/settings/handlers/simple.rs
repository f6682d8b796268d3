//! Simple setting handlers for single-value settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    mutate_config_with_message, success_set, success_unset, validate_provider,
};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;
use crate::core::session::ProviderKind;

/// Handler for the `provider` setting.
pub struct ProviderHandler;

impl SettingHandler for ProviderHandler {
    fn key(&self) -> &'static str {
        "provider"
    }

    fn set(&self, args: &[String]) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set the provider new sessions start on, specify it:",
                example: "nexus set provider openrouter",
            });
        }

        let provider = validate_provider(&args.join(" "))?;
        let message = success_set("provider", provider.as_str());

        mutate_config_with_message(
            move |config| {
                config.provider = Some(provider);
                Ok(())
            },
            message,
        )
    }

    fn unset(&self) -> Result<String, SettingError> {
        mutate_config_with_message(
            |config| {
                config.provider = None;
                Ok(())
            },
            success_unset("provider"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.provider {
            Some(provider) => format!("  provider: {provider}"),
            None => format!("  provider: (unset, default: {})", ProviderKind::default()),
        }
    }
}
