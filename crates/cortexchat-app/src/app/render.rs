use colored::Colorize;
use std::io::{self, Write};

use cortexchat_agent::StreamChunk;

/// Shown when a reply finished without any text
pub const EMPTY_REPLY: &str = "I'm sorry, I wasn't able to generate a response.";

/// What the user ends up seeing for one reply
#[derive(Debug, Default)]
pub struct Reply {
    text: String,
    upstream_error: Option<String>,
    fatal: Option<String>,
    tools: Vec<String>,
    completed: bool,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, chunk: &StreamChunk) {
        match chunk {
            StreamChunk::TextDelta(text) => self.text.push_str(text),
            StreamChunk::ToolUse(_) => {
                if let Some(name) = chunk.tool_name() {
                    self.tools.push(name.to_string());
                }
            }
            StreamChunk::Error(message) => self.upstream_error = Some(message.clone()),
            StreamChunk::Done(_) => self.completed = true,
            StreamChunk::ThinkingDelta(_) | StreamChunk::Status(_) | StreamChunk::ToolResult(_) => {}
        }
    }

    /// Record an error that ended the call
    pub fn fail(&mut self, message: impl Into<String>) {
        self.fatal = Some(message.into());
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Final reply text; never empty
    pub fn final_text(&self) -> String {
        if let Some(fatal) = &self.fatal {
            return format!("Error: {}", fatal);
        }
        if let Some(error) = &self.upstream_error {
            return format!("I'm sorry, I ran into an issue: {}", error);
        }
        if self.text.trim().is_empty() {
            return EMPTY_REPLY.to_string();
        }
        self.text.clone()
    }

    /// The final text differs from what was already streamed to the terminal
    pub fn needs_replacement(&self) -> bool {
        self.final_text() != self.text
    }
}

/// Prints chunks to the terminal as they arrive
pub struct ChunkPrinter {
    show_thinking: bool,
    verbose: bool,
    mid_line: bool,
}

impl ChunkPrinter {
    pub fn new(show_thinking: bool, verbose: bool) -> Self {
        Self {
            show_thinking,
            verbose,
            mid_line: false,
        }
    }

    pub fn print(&mut self, chunk: &StreamChunk) {
        match chunk {
            StreamChunk::TextDelta(text) => {
                print!("{}", text);
                self.mid_line = !text.ends_with('\n');
            }
            StreamChunk::ThinkingDelta(text) => {
                if self.show_thinking {
                    print!("{}", text.bright_black());
                    self.mid_line = !text.ends_with('\n');
                }
            }
            StreamChunk::Status(status) => {
                self.break_line();
                println!("{}", format!("⏳ {}", status).bright_black());
            }
            StreamChunk::ToolUse(payload) => {
                self.break_line();
                println!("{}", format!("🔧 {}", describe_tool_use(payload)).cyan());
                if self.verbose {
                    if let Ok(pretty) = serde_json::to_string_pretty(payload) {
                        println!("{}", pretty.bright_black());
                    }
                }
            }
            StreamChunk::ToolResult(payload) => {
                self.break_line();
                println!("{}", format!("📋 {}", summarize_tool_result(payload)).bright_black());
            }
            StreamChunk::Done(_) => self.break_line(),
            StreamChunk::Error(_) => self.break_line(),
        }
        io::stdout().flush().ok();
    }

    /// Make sure the next output starts on a fresh line
    pub fn break_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

/// One-line description of a tool invocation payload
pub fn describe_tool_use(payload: &serde_json::Value) -> String {
    match payload.get("name").and_then(|v| v.as_str()) {
        Some(name) => format!("Using: {}", name),
        None => "Using a tool".to_string(),
    }
}

/// One-line description of a tool result payload
pub fn summarize_tool_result(payload: &serde_json::Value) -> String {
    let name = payload
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("tool");
    match payload.get("status").and_then(|v| v.as_str()) {
        Some(status) => format!("Result from {} ({})", name, status),
        None => format!("Result from {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_streamed_text_is_final_text() {
        let mut reply = Reply::new();
        reply.absorb(&StreamChunk::Status("Looking up order".to_string()));
        reply.absorb(&StreamChunk::TextDelta("Your order ".to_string()));
        reply.absorb(&StreamChunk::TextDelta("has shipped.".to_string()));
        reply.absorb(&StreamChunk::Done(json!({})));

        assert!(reply.completed());
        assert_eq!(reply.final_text(), "Your order has shipped.");
        assert!(!reply.needs_replacement());
    }

    #[test]
    fn test_upstream_error_replaces_text() {
        let mut reply = Reply::new();
        reply.absorb(&StreamChunk::TextDelta("Hi".to_string()));
        reply.absorb(&StreamChunk::Error("boom".to_string()));

        assert_eq!(reply.final_text(), "I'm sorry, I ran into an issue: boom");
        assert!(reply.needs_replacement());
    }

    #[test]
    fn test_fatal_error_wins() {
        let mut reply = Reply::new();
        reply.absorb(&StreamChunk::TextDelta("Hi".to_string()));
        reply.fail("Could not reach the assistant.");

        assert_eq!(reply.final_text(), "Error: Could not reach the assistant.");
    }

    #[test]
    fn test_empty_reply_gets_fallback() {
        let mut reply = Reply::new();
        reply.absorb(&StreamChunk::Done(json!({})));
        assert_eq!(reply.final_text(), EMPTY_REPLY);

        let mut whitespace = Reply::new();
        whitespace.absorb(&StreamChunk::TextDelta("  ".to_string()));
        assert_eq!(whitespace.final_text(), EMPTY_REPLY);
    }

    #[test]
    fn test_tools_are_collected() {
        let mut reply = Reply::new();
        reply.absorb(&StreamChunk::ToolUse(json!({"name": "order_lookup"})));
        reply.absorb(&StreamChunk::ToolResult(json!({"name": "order_lookup"})));
        reply.absorb(&StreamChunk::ToolUse(json!({})));
        assert_eq!(reply.tools(), &["order_lookup".to_string(), "unknown".to_string()]);
    }

    #[test]
    fn test_describe_tool_use() {
        assert_eq!(describe_tool_use(&json!({"name": "order_lookup", "input": {}})), "Using: order_lookup");
        assert_eq!(describe_tool_use(&json!({"input": {}})), "Using a tool");
        assert_eq!(describe_tool_use(&json!({"name": 7})), "Using a tool");
    }

    #[test]
    fn test_summarize_tool_result() {
        assert_eq!(summarize_tool_result(&json!({"name": "search", "status": "success"})), "Result from search (success)");
        assert_eq!(summarize_tool_result(&json!({})), "Result from tool");
    }
}
