mod registry;

pub use registry::{all_commands, CommandInvocation};

use std::path::PathBuf;

use crate::core::app::App;
use crate::core::session::{ProviderKind, SettingsUpdate};
use crate::core::voice::VoiceState;

pub enum CommandResult {
    Continue,
    /// Text to show the user.
    Notice(String),
    ProcessAsMessage(String),
    /// Read the file and stage it; needs async I/O.
    Attach(PathBuf),
    /// Print catalog entries matching the query, fetching first if needed.
    ListModels(String),
    /// The credential changed; refetch the catalog.
    RefreshCatalog,
    /// A voice session started connecting.
    VoiceConnecting,
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(app, invocation)
    } else {
        CommandResult::Notice(format!(
            "Unknown command: /{command_name}. Type /help for the list."
        ))
    }
}

/// Parse a 1-based position as shown in listings.
fn parse_position(args: &str) -> Option<usize> {
    args.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
}

fn usage(name: &str) -> CommandResult {
    let usage = registry::find_command(name)
        .map(|command| command.usage)
        .unwrap_or_default();
    CommandResult::Notice(format!("Usage: {usage}"))
}

pub(super) fn handle_help(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Type a message and press Enter to send it.\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<32} {}\n", command.usage, command.help));
    }
    CommandResult::Notice(help.trim_end().to_string())
}

pub(super) fn handle_attach(_app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage("attach");
    }
    CommandResult::Attach(PathBuf::from(invocation.args))
}

pub(super) fn handle_detach(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let count = app.composer.attachments().len();
        app.composer.clear_attachments();
        return CommandResult::Notice(format!("Removed {count} attachment(s)."));
    }
    let Some(index) = parse_position(invocation.args) else {
        return usage("detach");
    };
    match app.composer.remove_attachment(index) {
        Some(removed) => CommandResult::Notice(format!(
            "Removed {}.",
            removed.attachment.display_name()
        )),
        None => CommandResult::Notice(format!("No attachment #{}.", invocation.args)),
    }
}

pub(super) fn handle_new(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.new_session();
    CommandResult::Notice("Started a new session.".to_string())
}

pub(super) fn handle_sessions(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let active = app.store.active_id();
    let lines: Vec<String> = app
        .store
        .sessions()
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let marker = if Some(session.id.as_str()) == active {
                "*"
            } else {
                " "
            };
            format!(
                "{marker} {}. {} [{}, {} messages]",
                index + 1,
                session.title,
                session.provider.display_name(),
                session.messages.len()
            )
        })
        .collect();
    if lines.is_empty() {
        CommandResult::Notice("No sessions. Type a message or /new to start one.".to_string())
    } else {
        CommandResult::Notice(lines.join("\n"))
    }
}

pub(super) fn handle_switch(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(index) = parse_position(invocation.args) else {
        return usage("switch");
    };
    if app.select_session(index) {
        let title = app
            .store
            .active()
            .map(|session| session.title.clone())
            .unwrap_or_default();
        CommandResult::Notice(format!("Switched to: {title}"))
    } else {
        CommandResult::Notice(format!("No session #{}.", invocation.args))
    }
}

pub(super) fn handle_delete(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let index = if invocation.args.is_empty() {
        None
    } else {
        match parse_position(invocation.args) {
            Some(index) => Some(index),
            None => return usage("delete"),
        }
    };
    if app.delete_session(index) {
        CommandResult::Notice("Session deleted.".to_string())
    } else {
        CommandResult::Notice("No such session.".to_string())
    }
}

pub(super) fn handle_provider(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return CommandResult::Notice(format!(
            "Provider: {}",
            app.active_provider().display_name()
        ));
    }
    match invocation.args.parse::<ProviderKind>() {
        Ok(provider) => {
            app.update_settings(SettingsUpdate::provider(provider));
            CommandResult::Notice(format!("Provider set to {}.", provider.display_name()))
        }
        Err(err) => CommandResult::Notice(err),
    }
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let model = app
            .store
            .active()
            .and_then(|session| session.effective_model())
            .unwrap_or("(none)")
            .to_string();
        return CommandResult::Notice(format!("Model: {model}"));
    }
    app.set_model(invocation.args);
    CommandResult::Notice(format!(
        "{} model set to {}.",
        app.active_provider().display_name(),
        invocation.args
    ))
}

pub(super) fn handle_models(_app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::ListModels(invocation.args.to_string())
}

pub(super) fn handle_key(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage("key");
    }
    if app.update_settings(SettingsUpdate::openrouter_key(invocation.args)) {
        CommandResult::RefreshCatalog
    } else {
        CommandResult::Continue
    }
}

pub(super) fn handle_search(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let use_search = match invocation.args.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => true,
        "off" | "false" | "no" => false,
        _ => return usage("search"),
    };
    app.update_settings(SettingsUpdate {
        use_search: Some(use_search),
        ..SettingsUpdate::default()
    });
    CommandResult::Notice(format!(
        "Search grounding {}.",
        if use_search { "on" } else { "off" }
    ))
}

pub(super) fn handle_thinking(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Ok(budget) = invocation.args.parse::<u32>() else {
        return usage("thinking");
    };
    app.update_settings(SettingsUpdate {
        thinking_budget: Some(budget),
        ..SettingsUpdate::default()
    });
    CommandResult::Notice(format!(
        "Thinking budget: {}",
        app.store.settings().thinking_budget()
    ))
}

pub(super) fn handle_temperature(
    app: &mut App,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Ok(temperature) = invocation.args.parse::<f32>() else {
        return usage("temperature");
    };
    app.update_settings(SettingsUpdate {
        temperature: Some(temperature),
        ..SettingsUpdate::default()
    });
    CommandResult::Notice(format!(
        "Temperature: {}",
        app.store.settings().temperature()
    ))
}

pub(super) fn handle_voice(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.toggle_voice() {
        Ok(VoiceState::Connecting) => CommandResult::VoiceConnecting,
        Ok(VoiceState::Closed) => CommandResult::Notice("Voice session closed.".to_string()),
        Ok(state) => CommandResult::Notice(state.label().to_string()),
        Err(err) => CommandResult::Notice(err.to_string()),
    }
}

pub(super) fn handle_stop(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    if app.cancel_active_stream() {
        CommandResult::Notice("Stopped.".to_string())
    } else {
        CommandResult::Notice("Nothing is streaming.".to_string())
    }
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
