//! Model listing functionality
//!
//! Prints the OpenRouter catalog, optionally narrowed by a search term.

use std::error::Error;

use crate::api::models::filter_models;
use crate::auth::AuthManager;
use crate::core::config::data::Config;
use crate::core::constants::CATALOG_PREVIEW_LIMIT;
use crate::core::providers::OpenRouterClient;
use crate::core::session::ProviderKind;
use crate::ui::render::model_listing;

pub async fn list_models(query: &str) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let Some(credential) = AuthManager::new().resolve(ProviderKind::OpenRouter) else {
        eprintln!("❌ No OpenRouter API key configured");
        eprintln!();
        eprintln!("Please either:");
        eprintln!("1. Run 'nexus auth openrouter' to store a key, or");
        eprintln!("2. Set the OPENROUTER_API_KEY environment variable");
        std::process::exit(1);
    };

    let client = OpenRouterClient::new(
        reqwest::Client::new(),
        config.openrouter_base_url(),
        config.referer(),
    );
    let models = client.list_models(&credential).await;

    println!("🤖 Available OpenRouter Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    if let Some(model) = config.openrouter_model.as_deref() {
        println!("🎯 Selected model: {model} (from config)");
        println!();
    }

    if models.is_empty() {
        println!("No models found. Check your key and network connection.");
        return Ok(());
    }

    let matches = filter_models(&models, query);
    if matches.is_empty() {
        println!("No models match '{}'.", query.trim());
    } else {
        if query.trim().is_empty() && models.len() > CATALOG_PREVIEW_LIMIT {
            println!(
                "Showing {} of {} models; add a search term to narrow the list:",
                matches.len(),
                models.len()
            );
            println!();
        }
        println!("{}", model_listing(&matches));
    }
    Ok(())
}
