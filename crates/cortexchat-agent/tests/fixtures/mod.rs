#![allow(dead_code)]

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use cortexchat_agent::{AgentConfig, StreamingSession};
use cortexchat_logging::MemoryTraceSink;
use serde_json::{json, Value};
use wiremock::matchers::*;
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_PAT: &str = "test-pat-0123456789";

pub const RUN_PATH: &str = "/api/v2/databases/BOOKLY/schemas/SUPPORT/agents/BOOKLY_SUPPORT_AGENT:run";

/// Build a raw SSE body from `(event name, data)` pairs
pub fn sse_body(frames: &[(&str, &str)]) -> String {
    frames
        .iter()
        .map(|(event, data)| format!("event: {}\ndata: {}\n\n", event, data))
        .collect()
}

/// A plausible final `response` payload
pub fn final_message(text: &str) -> Value {
    json!({
        "role": "assistant",
        "content": [
            {"type": "text", "text": text}
        ]
    })
}

/// Mock server utilities for exercising a streaming session
pub struct AgentMockServer {
    server: MockServer,
}

impl AgentMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn config(&self) -> AgentConfig {
        AgentConfig::new(self.uri(), TEST_PAT)
    }

    /// Session pointed at this server with an in-memory trace sink
    pub fn session(&self) -> (StreamingSession, Arc<MemoryTraceSink>) {
        let tracer = Arc::new(MemoryTraceSink::new());
        let session = StreamingSession::new(self.config())
            .expect("valid test config")
            .with_tracer(tracer.clone());
        (session, tracer)
    }

    /// Answer every run request with the given SSE body
    pub async fn mock_stream(&self, body: String) {
        Mock::given(method("POST"))
            .and(path(RUN_PATH))
            .and(header("authorization", format!("Bearer {}", TEST_PAT).as_str()))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }

    /// Answer the next run request only, so a later mock can take over
    pub async fn mock_stream_once(&self, body: String) {
        Mock::given(method("POST"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Fail every run request with `status` and a plain-text body
    pub async fn mock_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path(RUN_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// JSON bodies of all requests received so far
    pub async fn request_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
            .collect()
    }
}

/// Hand-written HTTP server for body shapes wiremock cannot produce: a body
/// cut off mid-stream, or one whose second half is held back.
pub struct RawStreamServer {
    uri: String,
    release: Option<oneshot::Sender<()>>,
}

impl RawStreamServer {
    /// Send `head`, then close the connection although `content-length` promised more
    pub async fn truncated(head: String) -> Self {
        let declared = head.len() + 1024;
        Self::start(head, None, declared).await
    }

    /// Send `head`, wait for [`RawStreamServer::release`], then send `tail` and finish
    pub async fn held(head: String, tail: String) -> Self {
        let declared = head.len() + tail.len();
        Self::start(head, Some(tail), declared).await
    }

    async fn start(head: String, tail: Option<String>, declared: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let (release_tx, release_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept run request");
            read_request(&mut socket).await;

            let response_head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\n\r\n",
                declared
            );
            socket.write_all(response_head.as_bytes()).await.expect("write head");
            socket.write_all(head.as_bytes()).await.expect("write first frames");
            socket.flush().await.expect("flush first frames");

            if let Some(tail) = tail {
                let _ = release_rx.await;
                socket.write_all(tail.as_bytes()).await.expect("write remaining frames");
                socket.flush().await.expect("flush remaining frames");
            }
            let _ = socket.shutdown().await;
        });

        Self {
            uri: format!("http://{}", addr),
            release: Some(release_tx),
        }
    }

    pub fn uri(&self) -> String {
        self.uri.clone()
    }

    /// Let a held server send the rest of its body
    pub fn release(&mut self) {
        if let Some(tx) = self.release.take() {
            let _ = tx.send(());
        }
    }

    /// Session pointed at this server with an in-memory trace sink
    pub fn session(&self) -> (StreamingSession, Arc<MemoryTraceSink>) {
        let tracer = Arc::new(MemoryTraceSink::new());
        let session = StreamingSession::new(AgentConfig::new(self.uri(), TEST_PAT))
            .expect("valid test config")
            .with_tracer(tracer.clone());
        (session, tracer)
    }
}

/// Consume one HTTP request (headers plus `content-length` body)
async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        received.extend_from_slice(&buf[..n]);

        if let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&received[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if received.len() >= end + 4 + length {
                return;
            }
        }
    }
}
