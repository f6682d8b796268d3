use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "attach",
        usage: "/attach <path>",
        help: "Stage a file for the next message.",
        handler: super::handle_attach,
    },
    Command {
        name: "detach",
        usage: "/detach [n]",
        help: "Remove staged attachment n, or all of them.",
        handler: super::handle_detach,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new session.",
        handler: super::handle_new,
    },
    Command {
        name: "sessions",
        usage: "/sessions",
        help: "List sessions, newest first.",
        handler: super::handle_sessions,
    },
    Command {
        name: "switch",
        usage: "/switch <n>",
        help: "Make session n active.",
        handler: super::handle_switch,
    },
    Command {
        name: "delete",
        usage: "/delete [n]",
        help: "Delete session n, or the active one.",
        handler: super::handle_delete,
    },
    Command {
        name: "provider",
        usage: "/provider <gemini|openrouter>",
        help: "Switch the backend for the active session.",
        handler: super::handle_provider,
    },
    Command {
        name: "model",
        usage: "/model <id>",
        help: "Switch the model for the active provider.",
        handler: super::handle_model,
    },
    Command {
        name: "models",
        usage: "/models [query]",
        help: "Search the OpenRouter catalog.",
        handler: super::handle_models,
    },
    Command {
        name: "key",
        usage: "/key <credential>",
        help: "Set the OpenRouter API key and refresh the catalog.",
        handler: super::handle_key,
    },
    Command {
        name: "search",
        usage: "/search on|off",
        help: "Toggle web-search grounding (Gemini).",
        handler: super::handle_search,
    },
    Command {
        name: "thinking",
        usage: "/thinking <tokens>",
        help: "Set the reasoning budget, 0 to disable (Gemini).",
        handler: super::handle_thinking,
    },
    Command {
        name: "temperature",
        usage: "/temperature <value>",
        help: "Set the sampling temperature (Gemini).",
        handler: super::handle_temperature,
    },
    Command {
        name: "voice",
        usage: "/voice",
        help: "Open or close a voice session (Gemini).",
        handler: super::handle_voice,
    },
    Command {
        name: "stop",
        usage: "/stop",
        help: "Stop the reply streaming into the active session.",
        handler: super::handle_stop,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave Nexus.",
        handler: super::handle_quit,
    },
];
