//! String setting handlers for text-based settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    mutate_config_with_message, success_set, truncate_with_ellipsis,
};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;
use crate::core::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_NATIVE_MODEL, DEFAULT_OPENROUTER_BASE_URL, DEFAULT_REFERER,
    DEFAULT_SYSTEM_INSTRUCTION,
};

/// Data-driven handler for free-form text settings. Multi-word values are
/// joined with spaces.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: Option<&'static str>,
    get: fn(&Config) -> Option<&String>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String]) -> Result<String, SettingError> {
        let value = args.join(" ").trim().to_string();
        if value.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let message = success_set(self.key, &truncate_with_ellipsis(&value, 50));
        let set_field = self.set_field;
        mutate_config_with_message(
            move |config| {
                set_field(config, Some(value));
                Ok(())
            },
            message,
        )
    }

    fn unset(&self) -> Result<String, SettingError> {
        let set_field = self.set_field;
        let message = match self.default_display {
            Some(default) => format!(
                "✅ Unset {} (will use default: {})",
                self.key,
                truncate_with_ellipsis(default, 40)
            ),
            None => format!("✅ Unset {}", self.key),
        };
        mutate_config_with_message(
            move |config| {
                set_field(config, None);
                Ok(())
            },
            message,
        )
    }

    fn format(&self, config: &Config) -> String {
        match ((self.get)(config), self.default_display) {
            (Some(value), _) => {
                let flat = value.replace('\n', " ");
                format!("  {}: {}", self.key, truncate_with_ellipsis(&flat, 50))
            }
            (None, Some(default)) => format!(
                "  {}: (unset, default: {})",
                self.key,
                truncate_with_ellipsis(default, 40)
            ),
            (None, None) => format!("  {}: (unset)", self.key),
        }
    }
}

pub fn openrouter_model_handler() -> StringHandler {
    StringHandler {
        key: "openrouter-model",
        hint: "To set the OpenRouter model, give its id:",
        example: "nexus set openrouter-model anthropic/claude-3.5-sonnet",
        default_display: None,
        get: |c| c.openrouter_model.as_ref(),
        set_field: |c, v| c.openrouter_model = v,
    }
}

pub fn gemini_model_handler() -> StringHandler {
    StringHandler {
        key: "gemini-model",
        hint: "To set the Gemini model for new sessions, give its id:",
        example: "nexus set gemini-model gemini-2.5-flash",
        default_display: Some(DEFAULT_NATIVE_MODEL),
        get: |c| c.gemini_model.as_ref(),
        set_field: |c, v| c.gemini_model = v,
    }
}

pub fn system_instruction_handler() -> StringHandler {
    StringHandler {
        key: "system-instruction",
        hint: "To set the Gemini system instruction, provide the text:",
        example: "nexus set system-instruction \"Answer tersely.\"",
        default_display: Some(DEFAULT_SYSTEM_INSTRUCTION),
        get: |c| c.system_instruction.as_ref(),
        set_field: |c, v| c.system_instruction = v,
    }
}

pub fn gemini_base_url_handler() -> StringHandler {
    StringHandler {
        key: "gemini-base-url",
        hint: "To point Gemini requests elsewhere, give the API base URL:",
        example: "nexus set gemini-base-url https://generativelanguage.googleapis.com/v1beta",
        default_display: Some(DEFAULT_GEMINI_BASE_URL),
        get: |c| c.gemini_base_url.as_ref(),
        set_field: |c, v| c.gemini_base_url = v,
    }
}

pub fn openrouter_base_url_handler() -> StringHandler {
    StringHandler {
        key: "openrouter-base-url",
        hint: "To point OpenRouter requests elsewhere, give the API base URL:",
        example: "nexus set openrouter-base-url https://openrouter.ai/api/v1",
        default_display: Some(DEFAULT_OPENROUTER_BASE_URL),
        get: |c| c.openrouter_base_url.as_ref(),
        set_field: |c, v| c.openrouter_base_url = v,
    }
}

pub fn referer_handler() -> StringHandler {
    StringHandler {
        key: "referer",
        hint: "To set the attribution URL sent to OpenRouter, give it:",
        example: "nexus set referer https://example.com",
        default_display: Some(DEFAULT_REFERER),
        get: |c| c.referer.as_ref(),
        set_field: |c, v| c.referer = v,
    }
}
