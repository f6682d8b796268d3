//! A minimal HTTP/1.1 stub server for exercising the provider adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned answer for one accepted connection.
#[derive(Clone, Debug)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl StubResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.into(),
        }
    }

    /// An event stream whose frames are the given `data:` payloads.
    pub fn sse<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let body = payloads
            .into_iter()
            .map(|payload| format!("data: {}\n\n", payload.as_ref()))
            .collect::<String>();
        Self {
            status: 200,
            content_type: "text/event-stream",
            body,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

pub struct HttpStub {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl HttpStub {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Bind a loopback listener that answers one connection per response, in
/// order, then stops accepting.
pub async fn spawn_http_stub(responses: Vec<StubResponse>) -> HttpStub {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let hits_for_server = Arc::clone(&hits);
    let requests_for_server = Arc::clone(&requests);
    tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            hits_for_server.fetch_add(1, Ordering::SeqCst);
            if let Ok(request) = read_http_request(&mut stream).await {
                requests_for_server.lock().unwrap().push(request);
            }
            let head = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                response.status,
                response.content_type,
                response.body.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(response.body.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    HttpStub {
        base_url: format!("http://{addr}"),
        hits,
        requests,
    }
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let header_end = loop {
        if let Some(index) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break index + 4;
        }
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("unexpected EOF while reading headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse().unwrap_or(0);
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 1024];
        let read = stream.read(&mut chunk).await.map_err(|err| err.to_string())?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

static CONFIG_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with `Config::load`/`save`/`mutate` pointed at a fresh file in a
/// temporary directory. Calls are serialized so tests never share a path.
pub fn with_test_config<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
    use crate::core::config::data::Config;

    let _guard = CONFIG_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("config.toml");
    Config::set_test_config_path(path.clone());
    let result = f(&path);
    Config::clear_test_config_override();
    result
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Sets environment variables for the lifetime of the guard and restores
/// the previous values on drop. Holds a process-wide lock meanwhile.
pub struct TestEnvVarGuard {
    saved: Vec<(String, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl TestEnvVarGuard {
    pub fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }

    fn remember(&mut self, key: &str) {
        if !self.saved.iter().any(|(saved, _)| saved == key) {
            self.saved.push((key.to_string(), std::env::var(key).ok()));
        }
    }

    pub fn set_var(&mut self, key: &str, value: &str) {
        self.remember(key);
        std::env::set_var(key, value);
    }

    pub fn remove_var(&mut self, key: &str) {
        self.remember(key);
        std::env::remove_var(key);
    }
}

impl Drop for TestEnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Backend that finishes every request immediately without output.
pub struct IdleBackend;

#[async_trait::async_trait]
impl crate::core::providers::ChatBackend for IdleBackend {
    async fn stream(
        &self,
        _request: crate::core::providers::ProviderRequest,
        _sink: &mut crate::core::providers::DeltaSink<'_>,
    ) -> Result<(), crate::core::providers::ProviderError> {
        Ok(())
    }
}

/// An app on default settings with one empty session, no keyring access and
/// no real backend.
pub fn create_test_app() -> crate::core::app::App {
    use crate::auth::AuthManager;
    use crate::core::app::App;
    use crate::core::providers::OpenRouterClient;
    use crate::core::session::ChatSettings;

    let (app, _rx) = App::with_backend(
        ChatSettings::default(),
        "gemini-test",
        None,
        Arc::new(IdleBackend),
        OpenRouterClient::new(reqwest::Client::new(), "http://127.0.0.1:9", "https://nexus.test"),
        AuthManager::new_with_keyring(false),
    );
    app
}
