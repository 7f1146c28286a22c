use serde_json::Value;

use crate::sse::SseEvent;

/// Message used when an `error` event carries no `message`
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Tool name recorded when a `response.tool_use` event carries no `name`
pub const UNKNOWN_TOOL: &str = "unknown";

/// One incremental update from the agent
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    TextDelta(String),
    ThinkingDelta(String),
    Status(String),
    ToolUse(Value),
    ToolResult(Value),
    /// Final assistant message; the turn has been committed to history
    Done(Value),
    /// Error reported by the agent itself
    Error(String),
}

/// Discriminant of [`StreamChunk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    TextDelta,
    ThinkingDelta,
    Status,
    ToolUse,
    ToolResult,
    Done,
    Error,
}

impl ChunkKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::TextDelta => "text_delta",
            Self::ThinkingDelta => "thinking_delta",
            Self::Status => "status",
            Self::ToolUse => "tool_use",
            Self::ToolResult => "tool_result",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl StreamChunk {
    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::TextDelta(_) => ChunkKind::TextDelta,
            Self::ThinkingDelta(_) => ChunkKind::ThinkingDelta,
            Self::Status(_) => ChunkKind::Status,
            Self::ToolUse(_) => ChunkKind::ToolUse,
            Self::ToolResult(_) => ChunkKind::ToolResult,
            Self::Done(_) => ChunkKind::Done,
            Self::Error(_) => ChunkKind::Error,
        }
    }

    /// `done` and `error` end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Error(_))
    }

    /// Name of the invoked tool, for `ToolUse` chunks
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolUse(payload) => Some(
                payload.get("name").and_then(Value::as_str).unwrap_or(UNKNOWN_TOOL),
            ),
            _ => None,
        }
    }
}

/// What a single SSE event turns into.
///
/// Only `Chunk` reaches the consumer. The other outcomes are the tolerated
/// cases: the stream keeps going as if the frame had not been sent.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Chunk(StreamChunk),
    /// `data` was empty or whitespace
    Blank,
    /// `data` was not valid JSON
    Malformed(String),
    /// event name outside the known set
    Unknown,
}

impl FrameOutcome {
    pub fn from_event(event: &SseEvent) -> Self {
        if event.data.trim().is_empty() {
            return Self::Blank;
        }

        let data: Value = match serde_json::from_str(&event.data) {
            Ok(data) => data,
            Err(e) => return Self::Malformed(e.to_string()),
        };

        let chunk = match event.event.as_str() {
            "response.text.delta" => StreamChunk::TextDelta(str_field(&data, "text", "")),
            "response.thinking.delta" => StreamChunk::ThinkingDelta(str_field(&data, "text", "")),
            "response.status" => StreamChunk::Status(str_field(&data, "message", "")),
            "response.tool_use" => StreamChunk::ToolUse(data),
            "response.tool_result" => StreamChunk::ToolResult(data),
            "response" => StreamChunk::Done(data),
            "error" => StreamChunk::Error(str_field(&data, "message", UNKNOWN_ERROR)),
            _ => return Self::Unknown,
        };
        Self::Chunk(chunk)
    }

    /// Reason for a skipped frame, `None` for chunks
    pub fn skip_reason(&self) -> Option<String> {
        match self {
            Self::Chunk(_) => None,
            Self::Blank => Some("blank data".to_string()),
            Self::Malformed(e) => Some(format!("malformed JSON ({})", e)),
            Self::Unknown => Some("unrecognized event name".to_string()),
        }
    }
}

fn str_field(data: &Value, key: &str, default: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}
