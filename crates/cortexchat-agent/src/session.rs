use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use futures_util::StreamExt;
use serde::Serialize;

use cortexchat_logging::{
    log_request, log_request_to_file, log_response, log_response_to_file, log_skipped_frame,
    log_stream_end, log_stream_event, log_stream_start, NullTraceSink, RunOutcome, RunSummary,
    TraceRun, TraceSink,
};

use crate::chunk::{FrameOutcome, StreamChunk};
use crate::config::AgentConfig;
use crate::conversation::{ConversationState, Message};
use crate::error::AgentError;
use crate::sse::SseDecoder;

/// Name under which each `send` is traced
pub const TRACE_RUN_NAME: &str = "chat_stream";

/// Lazy sequence of chunks produced by [`StreamingSession::send`].
///
/// Ends after a `Done` or `Error` chunk, after a transport `Err`, or when the
/// server closes the stream. The run is already traced when a `Done` or
/// `Error` chunk is yielded, so a consumer may stop polling there.
pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = Result<StreamChunk, AgentError>> + Send + 'a>>;

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: &'a [Message],
    stream: bool,
}

/// Conversation with one Cortex Agent over its streaming `:run` endpoint
pub struct StreamingSession {
    config: AgentConfig,
    endpoint: String,
    client: reqwest::Client,
    conversation: ConversationState,
    tracer: Arc<dyn TraceSink>,
}

impl StreamingSession {
    /// Start with an empty history
    pub fn new(config: AgentConfig) -> Result<Self, AgentError> {
        Self::with_conversation(config, ConversationState::new())
    }

    /// Start from an existing (e.g. seeded) history
    pub fn with_conversation(config: AgentConfig, conversation: ConversationState) -> Result<Self, AgentError> {
        config.validate()?;
        let endpoint = config.endpoint();
        Ok(Self {
            config,
            endpoint,
            client: reqwest::Client::new(),
            conversation,
            tracer: Arc::new(NullTraceSink),
        })
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TraceSink>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn into_conversation(self) -> ConversationState {
        self.conversation
    }

    /// Send one user message and stream the agent's reply.
    ///
    /// The user turn is appended before the request goes out. An HTTP error
    /// status or a connection failure fails the call itself, before any chunk
    /// exists. Otherwise the returned stream yields chunks in network order;
    /// the assistant turn is appended to the history right before the `Done`
    /// chunk is yielded, and that is the only change the stream makes to it.
    ///
    /// The session stays mutably borrowed until the stream is dropped.
    pub async fn send<'a>(&'a mut self, user_text: &str) -> Result<ChunkStream<'a>, AgentError> {
        self.conversation.append_user(user_text);

        let run = TraceRun::new(TRACE_RUN_NAME, user_text);
        self.tracer.run_started(&run).await;

        let response = match self.post().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = match e {
                    AgentError::Api { .. } => RunOutcome::ApiError,
                    _ => RunOutcome::TransportError,
                };
                let summary = RunSummary {
                    response: e.to_string(),
                    tools_used: Vec::new(),
                    outcome,
                };
                self.tracer.run_finished(&run, &summary).await;
                return Err(e);
            }
        };

        let verbose = self.config.verbose;
        let tracer = Arc::clone(&self.tracer);
        let conversation = &mut self.conversation;

        log_stream_start(verbose);

        let chunks = stream! {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            let mut full_text = String::new();
            let mut tools_used: Vec<String> = Vec::new();
            let mut outcome = RunOutcome::Incomplete;
            let mut event_counter = 0;

            'read: loop {
                let (events, eof) = match bytes.next().await {
                    Some(Ok(piece)) => (decoder.feed(&piece), false),
                    Some(Err(e)) => {
                        outcome = RunOutcome::TransportError;
                        yield Err(AgentError::Transport(e));
                        break 'read;
                    }
                    None => (decoder.finish().into_iter().collect::<Vec<_>>(), true),
                };

                for event in events {
                    event_counter += 1;
                    log_stream_event(event_counter, &event.event, &event.data, verbose);

                    let chunk = match FrameOutcome::from_event(&event) {
                        FrameOutcome::Chunk(chunk) => chunk,
                        skipped => {
                            if let Some(reason) = skipped.skip_reason() {
                                log_skipped_frame(&event.event, &reason, verbose);
                            }
                            continue;
                        }
                    };

                    match &chunk {
                        StreamChunk::TextDelta(text) => full_text.push_str(text),
                        StreamChunk::ToolUse(_) => {
                            if let Some(name) = chunk.tool_name() {
                                tools_used.push(name.to_string());
                            }
                        }
                        StreamChunk::Done(message) => {
                            conversation.append_from_server(message.clone());
                            outcome = RunOutcome::Completed;
                        }
                        StreamChunk::Error(message) => {
                            full_text = format!("Error: {}", message);
                            outcome = RunOutcome::UpstreamError;
                        }
                        _ => {}
                    }

                    if chunk.is_terminal() {
                        // The run is recorded before the terminal chunk leaves the stream
                        log_stream_end(event_counter, outcome.as_str(), verbose);
                        let summary = RunSummary { response: full_text, tools_used, outcome };
                        tracer.run_finished(&run, &summary).await;
                        yield Ok(chunk);
                        return;
                    }
                    yield Ok(chunk);
                }

                if eof {
                    break;
                }
            }

            log_stream_end(event_counter, outcome.as_str(), verbose);
            let summary = RunSummary { response: full_text, tools_used, outcome };
            tracer.run_finished(&run, &summary).await;
        };

        Ok(Box::pin(chunks))
    }

    /// Issue the streaming POST with the current history.
    async fn post(&self) -> Result<reqwest::Response, AgentError> {
        let messages = self.conversation.snapshot();
        let body = RunRequest {
            messages: &messages,
            stream: true,
        };

        log_request(&self.endpoint, &body, &self.config.token, self.config.verbose);

        let log_timestamp = self.config.log_dir.as_deref().and_then(|dir| {
            match log_request_to_file(dir, &self.endpoint, &body, &self.config.token) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    eprintln!("[Request log error] {:#}", e);
                    None
                }
            }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let headers = response.headers().clone();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            log_response(&status, &headers, &error_body, self.config.verbose);
            if let (Some(dir), Some(ts)) = (self.config.log_dir.as_deref(), log_timestamp) {
                if let Err(e) = log_response_to_file(dir, &status, &headers, &error_body, ts) {
                    eprintln!("[Response log error] {:#}", e);
                }
            }

            return Err(AgentError::Api {
                status: status.as_u16(),
                body: error_body,
            });
        }

        Ok(response)
    }
}
