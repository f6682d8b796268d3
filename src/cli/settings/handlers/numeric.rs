//! Numeric setting handlers. Values outside the accepted range are
//! rejected rather than clamped so typos surface immediately.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set};
use crate::cli::settings::SettingHandler;
use crate::core::config::data::Config;
use crate::core::constants::{DEFAULT_TEMPERATURE, MAX_TEMPERATURE, MAX_THINKING_BUDGET};

/// Handler for the `thinking-budget` setting.
pub struct ThinkingBudgetHandler;

impl SettingHandler for ThinkingBudgetHandler {
    fn key(&self) -> &'static str {
        "thinking-budget"
    }

    fn set(&self, args: &[String]) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the reasoning token budget, give a number (0 disables it):",
                example: "nexus set thinking-budget 4096",
            });
        };
        let budget = input
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|budget| *budget <= MAX_THINKING_BUDGET)
            .ok_or_else(|| SettingError::InvalidNumber {
                key: "thinking-budget",
                input: input.clone(),
                expected: "a whole number from 0 to 32768",
            })?;

        mutate_config_with_message(
            move |config| {
                config.thinking_budget = Some(budget);
                Ok(())
            },
            success_set(self.key(), &budget.to_string()),
        )
    }

    fn unset(&self) -> Result<String, SettingError> {
        mutate_config_with_message(
            |config| {
                config.thinking_budget = None;
                Ok(())
            },
            "✅ Unset thinking-budget (will use default: 0)".to_string(),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.thinking_budget {
            Some(budget) => format!("  thinking-budget: {budget}"),
            None => "  thinking-budget: (unset, default: 0)".to_string(),
        }
    }
}

/// Handler for the `temperature` setting.
pub struct TemperatureHandler;

impl SettingHandler for TemperatureHandler {
    fn key(&self) -> &'static str {
        "temperature"
    }

    fn set(&self, args: &[String]) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set the sampling temperature, give a number:",
                example: "nexus set temperature 0.4",
            });
        };
        let temperature = input
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|value| (0.0..=MAX_TEMPERATURE).contains(value))
            .ok_or_else(|| SettingError::InvalidNumber {
                key: "temperature",
                input: input.clone(),
                expected: "a number from 0 to 2",
            })?;

        mutate_config_with_message(
            move |config| {
                config.temperature = Some(temperature);
                Ok(())
            },
            success_set(self.key(), &temperature.to_string()),
        )
    }

    fn unset(&self) -> Result<String, SettingError> {
        mutate_config_with_message(
            |config| {
                config.temperature = None;
                Ok(())
            },
            format!("✅ Unset temperature (will use default: {DEFAULT_TEMPERATURE})"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.temperature {
            Some(temperature) => format!("  temperature: {temperature}"),
            None => format!("  temperature: (unset, default: {DEFAULT_TEMPERATURE})"),
        }
    }
}
