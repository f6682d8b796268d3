//! Line-oriented interactive chat loop.
//!
//! Input lines, stream updates and the voice connect timer are multiplexed
//! with `tokio::select!` so replies keep printing while the user types.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::{sleep_until, Instant};

use crate::auth::AuthManager;
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppInitConfig};
use crate::core::chat_stream::{StreamMessage, StreamReceiver, StreamTarget};
use crate::core::config::data::Config;
use crate::core::voice::VoiceState;
use crate::ui::render;
use crate::utils::attachments::load_attachment;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run_chat(init_config: AppInitConfig) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let (mut app, rx) = App::new_with_auth(init_config, &config, AuthManager::new())?;
    if app.store.settings().credential().is_some() {
        let count = app.refresh_catalog().await;
        tracing::debug!(count, "catalog loaded at startup");
    }

    let input = BufReader::new(tokio::io::stdin());
    let mut out = io::stdout();
    run_loop(&mut app, rx, input, &mut out).await
}

/// Drive `app` from `input` until `/quit` or end of input. At end of input
/// the loop keeps draining stream updates until nothing is in flight.
pub async fn run_loop<R, W>(
    app: &mut App,
    mut rx: StreamReceiver,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut input_open = true;
    let mut voice_pending = false;

    let model = app
        .store
        .active()
        .and_then(|session| session.effective_model())
        .map(str::to_owned);
    writeln!(out, "{}", render::banner(app.active_provider(), model.as_deref()))?;
    write_prompt(app, out)?;

    loop {
        if !input_open && !app.is_streaming() {
            break;
        }
        let voice_ready = app.voice.ready_at().unwrap_or_else(Instant::now);

        tokio::select! {
            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        if handle_line(app, &line, out, &mut voice_pending).await? == Flow::Quit {
                            break;
                        }
                    }
                    None => input_open = false,
                }
            }
            Some((message, target)) = rx.recv() => {
                render_stream_message(app, message, &target, out)?;
            }
            _ = sleep_until(voice_ready), if voice_pending => {
                voice_pending = false;
                if app.voice.state() == VoiceState::Listening {
                    writeln!(out, "🎙️  {}", VoiceState::Listening.label())?;
                    write_prompt(app, out)?;
                }
            }
            else => break,
        }
    }

    app.shutdown();
    Ok(())
}

async fn handle_line<W: Write>(
    app: &mut App,
    line: &str,
    out: &mut W,
    voice_pending: &mut bool,
) -> Result<Flow, Box<dyn Error>> {
    match process_input(app, line) {
        CommandResult::Continue => {}
        CommandResult::Notice(text) => writeln!(out, "{text}")?,
        CommandResult::ProcessAsMessage(text) => {
            if text.trim().is_empty() && app.composer.attachments().is_empty() {
                write_prompt(app, out)?;
                return Ok(Flow::Continue);
            }
            app.composer.set_text(text);
            match app.send() {
                Ok(Some(_)) => {
                    out.flush()?;
                    return Ok(Flow::Continue);
                }
                Ok(None) => writeln!(out, "⏳ Still answering. Wait for the reply or /stop it.")?,
                Err(err) => writeln!(out, "🔒 {err}")?,
            }
        }
        CommandResult::Attach(path) => match load_attachment(&path).await {
            Ok(staged) => {
                writeln!(out, "{}", render::attachment_line(&staged))?;
                app.composer.push_attachment(staged);
            }
            Err(err) => writeln!(out, "❌ {err}")?,
        },
        CommandResult::ListModels(query) => {
            if app.catalog().is_empty() {
                app.refresh_catalog().await;
            }
            let matches = app.search_catalog(&query);
            if matches.is_empty() {
                writeln!(out, "No models found. Set an OpenRouter key with /key first.")?;
            } else {
                writeln!(out, "{}", render::model_listing(&matches))?;
            }
        }
        CommandResult::RefreshCatalog => {
            let count = app.refresh_catalog().await;
            writeln!(out, "🔑 OpenRouter key updated; {count} models available.")?;
        }
        CommandResult::VoiceConnecting => {
            *voice_pending = true;
            writeln!(out, "🎙️  {}", VoiceState::Connecting.label())?;
        }
        CommandResult::Quit => return Ok(Flow::Quit),
    }
    write_prompt(app, out)?;
    Ok(Flow::Continue)
}

fn render_stream_message<W: Write>(
    app: &mut App,
    message: StreamMessage,
    target: &StreamTarget,
    out: &mut W,
) -> io::Result<()> {
    let active = app.store.active_id() == Some(target.session_id.as_str());
    let printed = match &message {
        StreamMessage::Chunk(text) => Some(text.clone()),
        StreamMessage::Error(err) => Some(format!("\n⚠️ Error: {err}")),
        _ => None,
    };
    let is_end = message == StreamMessage::End;

    if !app.handle_stream_message(message, target) {
        return Ok(());
    }

    if !active {
        if is_end {
            if let Some(session) = app.store.session(&target.session_id) {
                writeln!(out, "\n✅ Reply ready in \"{}\".", session.title)?;
                write_prompt(app, out)?;
            }
        }
        return Ok(());
    }

    if let Some(text) = printed {
        write!(out, "{text}")?;
        out.flush()?;
    }
    if is_end {
        writeln!(out)?;
        let sources = app
            .store
            .session(&target.session_id)
            .and_then(|session| session.messages.iter().find(|m| m.id == target.message_id))
            .and_then(|reply| reply.grounding.as_ref())
            .map(render::grounding_sources)
            .unwrap_or_default();
        if !sources.is_empty() {
            writeln!(out, "Sources:")?;
            for source in sources {
                writeln!(out, "{source}")?;
            }
        }
        write_prompt(app, out)?;
    }
    Ok(())
}

fn write_prompt<W: Write>(app: &App, out: &mut W) -> io::Result<()> {
    let streaming = app
        .store
        .active_id()
        .is_some_and(|id| app.store.is_in_flight(id));
    if !streaming {
        write!(out, "{}", render::PROMPT)?;
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::providers::{
        ChatBackend, DeltaSink, OpenRouterClient, ProviderError, ProviderRequest, StreamDelta,
    };
    use crate::core::session::ChatSettings;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct GroundedBackend;

    #[async_trait]
    impl ChatBackend for GroundedBackend {
        async fn stream(
            &self,
            request: ProviderRequest,
            sink: &mut DeltaSink<'_>,
        ) -> Result<(), ProviderError> {
            sink(StreamDelta::Text(format!("reply from {}", request.model())));
            sink(StreamDelta::Grounding(json!({
                "groundingChunks": [{"web": {"uri": "https://news.example", "title": "News"}}]
            })));
            Ok(())
        }
    }

    fn test_app() -> (App, StreamReceiver) {
        App::with_backend(
            ChatSettings::default(),
            "gemini-test",
            None,
            Arc::new(GroundedBackend),
            OpenRouterClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "https://nexus.test"),
            AuthManager::new_with_keyring(false),
        )
    }

    async fn run_script(script: &str) -> (App, String) {
        let (mut app, rx) = test_app();
        let mut out = Vec::new();
        run_loop(&mut app, rx, BufReader::new(script.as_bytes()), &mut out)
            .await
            .expect("loop");
        (app, String::from_utf8(out).expect("utf8"))
    }

    #[tokio::test]
    async fn message_streams_reply_and_sources_before_exit() {
        let (app, output) = run_script("hello\n").await;

        assert!(output.starts_with("Nexus AI Pro · Gemini · gemini-test"));
        assert!(output.contains("reply from gemini-test"));
        assert!(output.contains("[1] News <https://news.example>"));
        let session = app.store.active().expect("session");
        assert_eq!(session.title, "hello");
        assert_eq!(session.messages.len(), 2);
    }

    #[tokio::test]
    async fn quit_stops_reading_input() {
        let (app, output) = run_script("/quit\nnever sent\n").await;
        assert!(app.store.active().expect("session").messages.is_empty());
        assert!(!output.contains("reply from"));
    }

    #[tokio::test]
    async fn refused_send_prints_lock_notice() {
        let (app, output) =
            run_script("/provider openrouter\n/model vendor/model-x\nhi\n").await;
        assert!(output.contains("🔒 STRICT LOCK: OpenRouter selected but API Key is missing."));
        assert!(app.store.active().expect("session").messages.is_empty());
    }

    #[tokio::test]
    async fn missing_attachment_is_reported() {
        let (app, output) = run_script("/attach /definitely/not/here.png\n").await;
        assert!(output.contains("❌"));
        assert!(app.composer.attachments().is_empty());
    }

    #[tokio::test]
    async fn blank_lines_are_not_sent() {
        let (app, _output) = run_script("\n   \n").await;
        assert!(app.store.active().expect("session").messages.is_empty());
    }
}
