// Logging module - request diagnostics and run tracing
pub mod request_logger;
pub mod trace;

use std::path::{Path, PathBuf};
use anyhow::{Result, Context};

// Re-export request logging functions
pub use request_logger::{
    log_request,
    log_request_to_file,
    log_response,
    log_response_to_file,
    log_stream_event,
    log_stream_start,
    log_stream_end,
    log_skipped_frame,
    redact_token,
};

pub use trace::{
    TraceSink,
    TraceRun,
    RunSummary,
    RunOutcome,
    NullTraceSink,
    JsonlTraceSink,
    MemoryTraceSink,
    TraceRecord,
};

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = max_chars.saturating_sub(3);
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Create `dir` (and parents) if it does not exist yet and return it as an owned path.
pub fn ensure_dir(dir: &Path) -> Result<PathBuf> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(dir.to_path_buf())
}
