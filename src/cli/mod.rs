//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments and dispatches to the chat
//! loop, the one-shot commands and the settings handlers.

pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::{env_vars, AuthManager};
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{print_all, SettingError, SettingRegistry};
use crate::core::app::AppInitConfig;
use crate::core::config::data::Config;
use crate::core::session::ProviderKind;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LOG_ENV_VAR};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(version)]
#[command(about = "A terminal chat client for Gemini and OpenRouter")]
#[command(
    long_about = "Nexus streams multimodal conversations from Gemini directly or from any \
OpenRouter model. Attach images, video, audio or documents to a turn and keep several \
sessions side by side.\n\n\
Authentication:\n\
  Use 'nexus auth <provider>' to store an API key in your system keyring.\n\n\
Environment Variables (used when no key is stored):\n\
  GEMINI_API_KEY       Gemini API key (API_KEY is also accepted)\n\
  OPENROUTER_API_KEY   OpenRouter API key\n\
  NEXUS_LOG            Log filter, e.g. 'nexus=debug' (RUST_LOG also works)\n\n\
Commands inside the chat:\n\
  /help                List every command\n\
  /attach <path>       Stage a file for the next message\n\
  /provider <name>     Switch between gemini and openrouter\n\
  /quit                Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Provider to chat with: gemini or openrouter
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<ProviderKind>,

    /// Model to use for this run
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send one prompt and print the streamed reply
    Say {
        /// Files to attach to the prompt
        #[arg(short = 'a', long = "attach", value_name = "FILE")]
        attach: Vec<PathBuf>,
        /// Prompt text (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List OpenRouter models, optionally filtered by a search term
    Models {
        query: Vec<String>,
    },
    /// Set a configuration value, or show all values when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Reset a configuration value to its default
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Store an API key for a provider in the system keyring
    Auth {
        provider: ProviderKind,
    },
    /// Remove a stored API key
    Deauth {
        provider: ProviderKind,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;
    tracing::debug!(filter_var = LOG_ENV_VAR, "starting nexus");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let init_config = AppInitConfig {
        provider: args.provider,
        model: args.model,
    };

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(init_config).await,
        Commands::Say { attach, prompt } => run_say(prompt, attach, init_config).await,
        Commands::Models { query } => list_models(&query.join(" ")).await,
        Commands::Set { key, value } => {
            let registry = SettingRegistry::new();
            match key {
                None => {
                    let config = Config::load()?;
                    print_all(&registry, &config);
                    Ok(())
                }
                Some(key) => exit_on_setting_error(apply_set(&registry, &key, &value)),
            }
        }
        Commands::Unset { key } => {
            let registry = SettingRegistry::new();
            exit_on_setting_error(apply_unset(&registry, &key))
        }
        Commands::Auth { provider } => {
            let token = read_token(provider)?;
            if let Err(e) = AuthManager::new().store_token(provider, &token) {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            println!(
                "✅ Stored {} API key in the system keyring",
                provider.display_name()
            );
            Ok(())
        }
        Commands::Deauth { provider } => match AuthManager::new().remove_token(provider) {
            Ok(true) => {
                println!("✅ Removed stored {} API key", provider.display_name());
                Ok(())
            }
            Ok(false) => {
                println!("No stored {} API key", provider.display_name());
                Ok(())
            }
            Err(e) => {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
        },
    }
}

fn apply_set(registry: &SettingRegistry, key: &str, value: &[String]) -> Result<String, SettingError> {
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    handler.set(value)
}

fn apply_unset(registry: &SettingRegistry, key: &str) -> Result<String, SettingError> {
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    handler.unset()
}

fn exit_on_setting_error(result: Result<String, SettingError>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

fn read_token(provider: ProviderKind) -> Result<String, Box<dyn Error>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!(
            "Enter your {} API key (it is also read from {}): ",
            provider.display_name(),
            env_vars(provider).join(" or ")
        );
        io::stderr().flush()?;
    }
    let mut token = String::new();
    stdin.lock().read_line(&mut token)?;
    Ok(token.trim().to_string())
}

#[cfg(test)]
mod tests;
