//! Diagnostic logging setup.
//!
//! Everything goes through `tracing`; this module only decides the filter
//! and where the output lands. Chat transcripts are never written here.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "NEXUS_LOG";
const DEFAULT_DIRECTIVES: &str = "warn";

/// Pick the filter directives: `NEXUS_LOG`, then `RUST_LOG`, then `warn`.
pub fn filter_directives(nexus_log: Option<String>, rust_log: Option<String>) -> String {
    [nexus_log, rust_log]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string())
}

fn env_filter() -> EnvFilter {
    let directives = filter_directives(
        std::env::var(LOG_ENV_VAR).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log filter '{directives}': {err}");
        EnvFilter::new(DEFAULT_DIRECTIVES)
    })
}

/// Install the global subscriber. Output is appended to `log_file` when
/// given, otherwise written to stderr so it never mixes with streamed
/// replies on stdout.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter();
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| format!("Failed to open log file {}: {err}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| err as Box<dyn std::error::Error>)?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| err as Box<dyn std::error::Error>)?;
        }
    }
    tracing::debug!(log_file = ?log_file, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_variable_wins_over_rust_log() {
        assert_eq!(
            filter_directives(Some("nexus=debug".into()), Some("info".into())),
            "nexus=debug"
        );
    }

    #[test]
    fn blank_values_fall_through_to_default() {
        assert_eq!(filter_directives(Some("  ".into()), None), "warn");
        assert_eq!(filter_directives(None, Some("trace".into())), "trace");
    }

    #[test]
    fn second_init_reports_error_instead_of_panicking() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("nexus.log");
        let _ = init_tracing(Some(&path));
        assert!(path.exists());
        assert!(init_tracing(None).is_err());
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVES).is_ok());
    }
}
