use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::{safe_truncate, ensure_dir};

/// Longest body echoed to the console before truncation
const MAX_CONSOLE_BODY: usize = 5000;

/// Longest single stream event echoed to the console
const MAX_CONSOLE_EVENT: usize = 200;

/// Characters of a bearer token that may appear in logs
const TOKEN_PREFIX_CHARS: usize = 4;

/// Tokens shorter than this are fully masked
const MIN_TOKEN_CHARS_FOR_PREFIX: usize = 16;

/// Mask a bearer token; long tokens keep a short prefix so they can be told apart
pub fn redact_token(token: &str) -> String {
    if token.chars().count() < MIN_TOKEN_CHARS_FOR_PREFIX {
        return "***".to_string();
    }
    format!("{}***", token.chars().take(TOKEN_PREFIX_CHARS).collect::<String>())
}

fn describe_url(url: &str) -> Vec<(&'static str, String)> {
    let mut fields = vec![("URL", url.to_string())];
    if let Ok(parsed_url) = reqwest::Url::parse(url) {
        fields.push(("Host", parsed_url.host_str().unwrap_or("unknown").to_string()));
        fields.push(("Port", parsed_url.port().map(|p| p.to_string()).unwrap_or_else(||
            if parsed_url.scheme() == "https" { "443 (default)".to_string() } else { "80 (default)".to_string() }
        )));
        fields.push(("Scheme", parsed_url.scheme().to_string()));
    }
    fields
}

fn pretty_body(body: &str) -> String {
    // Try to pretty-print JSON, fall back to raw text
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

fn print_truncated(text: &str) {
    if text.chars().count() > MAX_CONSOLE_BODY {
        println!("{}", safe_truncate(text, MAX_CONSOLE_BODY));
        println!("\n{}", format!("... (truncated, total {} bytes)", text.len()).bright_black());
    } else {
        println!("{}", text);
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request<T: Serialize>(url: &str, request: &T, token: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());

    for (name, value) in describe_url(url) {
        println!("{}: {}", name.bright_yellow(), value);
    }

    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    println!("  Accept: text/event-stream");
    println!("  Authorization: Bearer {}", redact_token(token));

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(request) {
        Ok(json) => print_truncated(&json),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Log HTTP response details for debugging (console output)
pub fn log_response(status: &reqwest::StatusCode, headers: &reqwest::header::HeaderMap, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_green());
    println!("{}", "📥 HTTP RESPONSE DEBUG".bright_green().bold());
    println!("{}", "═".repeat(80).bright_green());

    println!("{}: {} {}",
        "Status".bright_yellow(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    println!("\n{}", "Headers:".bright_yellow());
    for (name, value) in headers.iter() {
        if let Ok(val_str) = value.to_str() {
            println!("  {}: {}", name.as_str().bright_white(), val_str);
        }
    }

    println!("\n{}", "Response Body:".bright_yellow());
    print_truncated(&pretty_body(body));

    println!("{}", "═".repeat(80).bright_green());
    println!();
}

/// Log one decoded SSE event (console output)
pub fn log_stream_event(event_num: usize, event: &str, data: &str, verbose: bool) {
    if !verbose {
        return;
    }

    let shown = if data.chars().count() > MAX_CONSOLE_EVENT {
        format!("{} ({} bytes)", safe_truncate(data, MAX_CONSOLE_EVENT), data.len())
    } else {
        data.to_string()
    };
    println!("{}", format!("📦 Event #{} [{}]: {}", event_num, event, shown).bright_black());
}

/// Announce the start of an event stream (console output)
pub fn log_stream_start(verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "📡 Starting streaming response...".bright_cyan());
    println!("{}", "═".repeat(80).bright_cyan());
}

/// Announce the end of an event stream (console output)
pub fn log_stream_end(events: usize, outcome: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", format!("✓ Stream closed after {} events ({})", events, outcome).bright_green());
    println!("{}", "═".repeat(80).bright_green());
}

/// Report a frame that was dropped without producing a chunk (console output)
pub fn log_skipped_frame(event: &str, reason: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", format!("⏭️  Skipped event [{}]: {}", event, reason).yellow());
}

/// Log HTTP request to file for persistent debugging.
///
/// Returns the timestamp used in the file name so the matching response
/// log can share it.
pub fn log_request_to_file<T: Serialize>(log_dir: &Path, url: &str, request: &T, token: &str) -> Result<i64> {
    let logs_dir = ensure_dir(log_dir)?;

    let now = chrono::Local::now();
    let timestamp = now.timestamp_millis();
    let filename = format!("req-{}.txt", timestamp);
    let file_path = logs_dir.join(&filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n\n", now.to_rfc3339()));

    for (name, value) in describe_url(url) {
        log_content.push_str(&format!("{}: {}\n", name, value));
    }

    log_content.push_str("\nHeaders:\n");
    log_content.push_str("  Content-Type: application/json\n");
    log_content.push_str("  Accept: text/event-stream\n");
    log_content.push_str(&format!("  Authorization: Bearer {}\n\n", redact_token(token)));

    log_content.push_str("Request Body:\n");
    match serde_json::to_string_pretty(request) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => {
            log_content.push_str(&format!("Error serializing request: {}\n", e));
        }
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    Ok(timestamp)
}

/// Log HTTP response to file for persistent debugging
pub fn log_response_to_file(
    log_dir: &Path,
    status: &reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
    body: &str,
    request_timestamp: i64,
) -> Result<()> {
    let logs_dir = ensure_dir(log_dir)?;

    let filename = format!("resp-{}.txt", request_timestamp);
    let file_path = logs_dir.join(&filename);

    let mut log_content = String::new();
    log_content.push_str("HTTP RESPONSE LOG\n");
    log_content.push_str("=================\n\n");
    log_content.push_str(&format!("Request Timestamp: {}\n\n", request_timestamp));

    log_content.push_str(&format!("Status: {} {}\n\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ));

    log_content.push_str("Headers:\n");
    for (name, value) in headers.iter() {
        if let Ok(val_str) = value.to_str() {
            log_content.push_str(&format!("  {}: {}\n", name.as_str(), val_str));
        }
    }

    log_content.push_str("\nResponse Body:\n");
    log_content.push_str(&pretty_body(body));
    log_content.push('\n');

    log_content.push_str("\n---\n");
    log_content.push_str(&format!("Response Size: {} bytes\n", body.len()));
    log_content.push_str(&format!("Content-Type: {}\n",
        headers.get("content-type")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
    ));

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write response log to {}", file_path.display()))?;

    Ok(())
}
