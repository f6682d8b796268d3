use super::*;
use crate::core::chat_stream::{StreamMessage, StreamReceiver, StreamTarget};
use crate::core::conversation::PreconditionError;
use crate::core::message::{Attachment, ComposerAttachment};
use crate::core::providers::{DeltaSink, ProviderError, ProviderRequest, StreamDelta};
use crate::core::voice::{VoiceState, VoiceUnavailable};
use crate::utils::test_utils::{spawn_http_stub, StubResponse};
use async_trait::async_trait;

/// Replies with the model name, then the number of turns it was given.
struct EchoBackend;

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn stream(
        &self,
        request: ProviderRequest,
        sink: &mut DeltaSink<'_>,
    ) -> Result<(), ProviderError> {
        sink(StreamDelta::Text(format!("{} ", request.model())));
        sink(StreamDelta::Text(request.turn_count().to_string()));
        Ok(())
    }
}

struct StalledBackend;

#[async_trait]
impl ChatBackend for StalledBackend {
    async fn stream(
        &self,
        _request: ProviderRequest,
        _sink: &mut DeltaSink<'_>,
    ) -> Result<(), ProviderError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

fn create_test_app(
    settings: ChatSettings,
    backend: Arc<dyn ChatBackend>,
    openrouter_base: &str,
) -> (App, StreamReceiver) {
    App::with_backend(
        settings,
        "gemini-test",
        None,
        backend,
        OpenRouterClient::new(reqwest::Client::new(), openrouter_base, "https://nexus.test"),
        AuthManager::new_with_keyring(false),
    )
}

async fn run_until_settled(app: &mut App, rx: &mut StreamReceiver, target: &StreamTarget) {
    while let Some((message, update_target)) = rx.recv().await {
        let done = message == StreamMessage::End && &update_target == target;
        app.handle_stream_message(message, &update_target);
        if done {
            break;
        }
    }
}

fn aggregator_settings() -> ChatSettings {
    let mut settings = ChatSettings::default();
    settings.apply(&SettingsUpdate {
        openrouter_key: Some("sk-test".to_string()),
        ..SettingsUpdate::openrouter_model("vendor/model-x")
    });
    settings
}

#[tokio::test]
async fn native_send_streams_into_pending_turn() {
    let (mut app, mut rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    app.composer.set_text("Hello there");

    let target = app.send().expect("send").expect("dispatched");
    assert!(app.is_streaming());
    assert!(app.composer.is_empty());

    run_until_settled(&mut app, &mut rx, &target).await;

    let session = app.store.active().expect("active session");
    assert_eq!(session.title, "Hello there");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[1].content, "gemini-test 1");
    assert!(!session.messages[1].pending);
    assert!(!app.is_streaming());
}

#[tokio::test]
async fn second_send_while_streaming_is_ignored() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(StalledBackend), "http://127.0.0.1:9");
    app.composer.set_text("first");
    assert!(app.send().expect("send").is_some());

    app.composer.set_text("second");
    assert!(app.send().expect("send").is_none());
    assert_eq!(app.composer.text(), "second");
    app.shutdown();
}

#[tokio::test]
async fn aggregator_without_credential_is_refused() {
    let mut settings = ChatSettings::default();
    settings.apply(&SettingsUpdate::openrouter_model("vendor/model-x"));
    let (mut app, _rx) = create_test_app(settings, Arc::new(EchoBackend), "http://127.0.0.1:9");
    app.composer.set_text("hi");

    assert_eq!(app.send().unwrap_err(), PreconditionError::MissingCredential);
    assert_eq!(app.composer.text(), "hi");
    assert!(app.store.active().expect("session").messages.is_empty());
}

#[tokio::test]
async fn aggregator_send_uses_global_model() {
    let (mut app, mut rx) =
        create_test_app(aggregator_settings(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    app.composer.set_text("hi");
    app.composer.push_attachment(ComposerAttachment::new(
        Attachment::new("cat.png", "image/png", Some("cat.png".to_string())),
        "AAAA",
    ));

    let target = app.send().expect("send").expect("dispatched");
    run_until_settled(&mut app, &mut rx, &target).await;

    let session = app.store.active().expect("active session");
    assert_eq!(session.messages[0].attachments.len(), 1);
    assert_eq!(session.messages[1].content, "vendor/model-x 1");
}

#[tokio::test]
async fn deleting_a_streaming_session_drops_its_updates() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(StalledBackend), "http://127.0.0.1:9");
    app.composer.set_text("hello");
    let target = app.send().expect("send").expect("dispatched");

    assert!(app.delete_session(None));
    assert!(!app.is_streaming());
    assert_eq!(app.store.active_id(), None);
    assert!(!app.handle_stream_message(StreamMessage::Chunk("late".into()), &target));
}

#[tokio::test]
async fn cancelling_keeps_partial_text_and_settles() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(StalledBackend), "http://127.0.0.1:9");
    app.composer.set_text("hello");
    let target = app.send().expect("send").expect("dispatched");
    app.handle_stream_message(StreamMessage::Chunk("partial".into()), &target);

    assert!(app.cancel_active_stream());
    assert!(!app.is_streaming());
    let reply = &app.store.active().expect("session").messages[1];
    assert_eq!(reply.content, "partial");
    assert!(!reply.pending);
    assert!(!app.cancel_active_stream());
}

#[tokio::test]
async fn select_and_delete_by_index() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    let first = app.store.active_id().expect("initial session").to_string();
    let second = app.new_session();
    assert_eq!(app.store.sessions()[0].id, second);

    assert!(app.select_session(1));
    assert_eq!(app.store.active_id(), Some(first.as_str()));
    assert!(!app.select_session(5));

    assert!(app.delete_session(Some(1)));
    assert_eq!(app.store.active_id(), Some(second.as_str()));
    assert!(!app.delete_session(Some(3)));
}

#[test]
fn credential_changes_request_catalog_refresh() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    assert!(!app.update_settings(SettingsUpdate::provider(ProviderKind::OpenRouter)));
    assert!(app.update_settings(SettingsUpdate::openrouter_key("sk-new")));
    assert_eq!(app.store.settings().credential(), Some("sk-new"));
    assert_eq!(app.active_provider(), ProviderKind::OpenRouter);
}

#[test]
fn set_model_follows_active_provider() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    assert!(app.set_model("gemini-other"));
    assert_eq!(
        app.store.active().map(|s| s.model_id.as_str()),
        Some("gemini-other")
    );

    app.update_settings(SettingsUpdate::provider(ProviderKind::OpenRouter));
    assert!(app.set_model("vendor/model-y"));
    assert_eq!(app.store.settings().aggregator_model(), Some("vendor/model-y"));
    assert!(!app.set_model("  "));
}

#[test]
fn init_config_overrides_provider_and_model() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    app.apply_init_config(AppInitConfig {
        provider: Some(ProviderKind::OpenRouter),
        model: Some("vendor/model-z".to_string()),
    });
    assert_eq!(app.active_provider(), ProviderKind::OpenRouter);
    assert_eq!(app.store.settings().aggregator_model(), Some("vendor/model-z"));
}

#[tokio::test(start_paused = true)]
async fn voice_toggles_only_on_native() {
    let (mut app, _rx) =
        create_test_app(ChatSettings::default(), Arc::new(EchoBackend), "http://127.0.0.1:9");
    assert_eq!(app.toggle_voice(), Ok(VoiceState::Connecting));
    assert_eq!(app.toggle_voice(), Ok(VoiceState::Closed));

    app.update_settings(SettingsUpdate::provider(ProviderKind::OpenRouter));
    assert_eq!(
        app.toggle_voice(),
        Err(VoiceUnavailable(ProviderKind::OpenRouter))
    );
}

#[tokio::test]
async fn catalog_refresh_uses_current_credential() {
    let stub = spawn_http_stub(vec![StubResponse::json(
        200,
        r#"{"data":[{"id":"vendor/model-x","name":"Model X"},{"id":"other/model-y","name":"Model Y"}]}"#,
    )])
    .await;
    let (mut app, _rx) = create_test_app(aggregator_settings(), Arc::new(EchoBackend), &stub.base_url);

    assert_eq!(app.refresh_catalog().await, 2);
    assert_eq!(app.search_catalog("MODEL-Y").len(), 1);
    assert_eq!(app.search_catalog("").len(), 2);
    assert_eq!(
        stub.requests()[0].header("authorization"),
        Some("Bearer sk-test")
    );
}
