//! Boolean setting handlers for on/off settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_bool, mutate_config, parse_bool};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;

/// Data-driven handler for boolean (on/off) settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<bool>,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String]) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        let set_field = self.set_field;

        mutate_config(move |config| {
            set_field(config, Some(value));
            Ok(())
        })?;

        Ok(format!("✅ Set {} to: {}", self.key, format_bool(value)))
    }

    fn unset(&self) -> Result<String, SettingError> {
        let set_field = self.set_field;

        mutate_config(move |config| {
            set_field(config, None);
            Ok(())
        })?;

        Ok(format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        ))
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

/// Create a handler for the `use-search` setting.
pub fn use_search_handler() -> BooleanHandler {
    BooleanHandler {
        key: "use-search",
        hint: "To toggle web-search grounding for new sessions, specify on or off:",
        example: "nexus set use-search on",
        default_display: "off",
        get: |c| c.use_search,
        set_field: |c, v| c.use_search = v,
    }
}
