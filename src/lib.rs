//! Nexus is a terminal chat client for multimodal conversations with Gemini,
//! either directly or through the OpenRouter aggregator.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns sessions, settings, provider selection and streaming
//!   orchestration.
//! - [`ui`] runs the interactive chat loop and formats what it prints.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`api`] defines chat and catalog payloads used by the provider clients.
//! - [`auth`] resolves credentials from the OS keyring and the environment.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`core::app`] and
//! [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
