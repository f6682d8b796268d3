//! One-shot "say" command: send a single prompt and print the reply.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::auth::AuthManager;
use crate::core::app::{App, AppInitConfig};
use crate::core::chat_stream::{StreamMessage, StreamReceiver, StreamTarget};
use crate::core::config::data::Config;
use crate::ui::render;
use crate::utils::attachments::load_attachment;

pub async fn run_say(
    prompt: Vec<String>,
    attachments: Vec<PathBuf>,
    init_config: AppInitConfig,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() && attachments.is_empty() {
        eprintln!("Usage: nexus say [-a FILE]... <prompt>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let (mut app, mut rx) = App::new_with_auth(init_config, &config, AuthManager::new())?;

    for path in &attachments {
        match load_attachment(path).await {
            Ok(staged) => app.composer.push_attachment(staged),
            Err(err) => {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
        }
    }
    app.composer.set_text(prompt);

    let target = match app.send() {
        Ok(Some(target)) => target,
        Ok(None) => return Ok(()),
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    let mut stdout = io::stdout();
    if let Err(err) = print_reply(&mut app, &mut rx, &target, &mut stdout).await? {
        eprintln!("\n\n❌ Error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

/// Print chunks for `target` as they arrive, followed by any cited sources.
/// The inner error carries a stream failure message.
async fn print_reply<W: Write>(
    app: &mut App,
    rx: &mut StreamReceiver,
    target: &StreamTarget,
    out: &mut W,
) -> io::Result<Result<(), String>> {
    let mut failure = None;
    while let Some((message, update_target)) = rx.recv().await {
        if &update_target != target {
            continue;
        }
        let done = message == StreamMessage::End;
        match &message {
            StreamMessage::Chunk(content) => {
                write!(out, "{content}")?;
                out.flush()?;
            }
            StreamMessage::Error(err) => failure = Some(err.clone()),
            _ => {}
        }
        app.handle_stream_message(message, &update_target);
        if done {
            break;
        }
    }

    if let Some(err) = failure {
        return Ok(Err(err));
    }
    writeln!(out)?;

    let sources = app
        .store
        .session(&target.session_id)
        .and_then(|session| session.messages.iter().find(|m| m.id == target.message_id))
        .and_then(|reply| reply.grounding.as_ref())
        .map(render::grounding_sources)
        .unwrap_or_default();
    if !sources.is_empty() {
        writeln!(out, "\nSources:")?;
        for source in sources {
            writeln!(out, "{source}")?;
        }
    }
    Ok(Ok(()))
}
