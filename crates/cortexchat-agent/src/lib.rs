//! # cortexchat-agent
//!
//! Streaming session manager for a remote Cortex Agent run endpoint.
//!
//! - **Conversation history**: an append-only transcript sent with every request
//! - **SSE decoding**: incremental, tolerant parsing of the agent's event stream
//! - **Typed chunks**: a closed `StreamChunk` enum instead of loose event records
//! - **Tracing**: each call reports its input and final text to a `TraceSink`
//!
//! ## Example
//!
//! ```rust,no_run
//! use cortexchat_agent::{AgentConfig, StreamingSession, StreamChunk};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AgentConfig::new("myaccount.snowflakecomputing.com", "my-pat");
//!     let mut session = StreamingSession::new(config)?;
//!
//!     let mut chunks = session.send("Where's my order ORD-1042?").await?;
//!     while let Some(chunk) = chunks.next().await {
//!         if let StreamChunk::TextDelta(text) = chunk? {
//!             print!("{}", text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod config;
pub mod conversation;
pub mod error;
pub mod session;
pub mod sse;

// Re-export commonly used types
pub use chunk::{ChunkKind, FrameOutcome, StreamChunk, UNKNOWN_ERROR};
pub use config::{
    AgentConfig,
    DEFAULT_AGENT_DATABASE,
    DEFAULT_AGENT_NAME,
    DEFAULT_AGENT_SCHEMA,
};
pub use conversation::{ConversationState, Message, Role};
pub use error::{AgentError, ConfigError};
pub use session::{ChunkStream, StreamingSession};
pub use sse::{SseDecoder, SseEvent};
