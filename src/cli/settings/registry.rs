//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    gemini_base_url_handler, gemini_model_handler, openrouter_base_url_handler,
    openrouter_model_handler, referer_handler, system_instruction_handler, use_search_handler,
    ProviderHandler, TemperatureHandler, ThinkingBudgetHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `nexus set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(ProviderHandler));
        registry.register(Box::new(openrouter_model_handler()));
        registry.register(Box::new(gemini_model_handler()));
        registry.register(Box::new(system_instruction_handler()));
        registry.register(Box::new(use_search_handler()));
        registry.register(Box::new(ThinkingBudgetHandler));
        registry.register(Box::new(TemperatureHandler));
        registry.register(Box::new(gemini_base_url_handler()));
        registry.register(Box::new(openrouter_base_url_handler()));
        registry.register(Box::new(referer_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
