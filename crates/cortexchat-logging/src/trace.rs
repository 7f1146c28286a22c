//! Run tracing for agent calls.
//!
//! Every `send` on a streaming session is one *run*: the sink hears about it
//! once when it starts (with the user's input) and once when it ends (with
//! the accumulated reply text and the tools the agent invoked). Sinks are
//! purely informational; a failing sink never changes what the caller sees.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// One traced agent call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRun {
    pub id: Uuid,
    pub name: String,
    pub started_at: DateTime<Local>,
    pub input: String,
}

impl TraceRun {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            started_at: Local::now(),
            input: input.into(),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The terminal `response` event arrived
    Completed,
    /// The server sent an `error` event
    UpstreamError,
    /// The initial POST returned a non-success status
    ApiError,
    /// The connection failed before or during streaming
    TransportError,
    /// The stream closed without a terminal event
    Incomplete,
}

impl RunOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "completed",
            Self::UpstreamError => "upstream_error",
            Self::ApiError => "api_error",
            Self::TransportError => "transport_error",
            Self::Incomplete => "incomplete",
        }
    }
}

/// Outputs recorded when a run ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub response: String,
    pub tools_used: Vec<String>,
    pub outcome: RunOutcome,
}

/// A single line written by a trace sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceRecord {
    Start {
        run: TraceRun,
    },
    Finish {
        run_id: Uuid,
        finished_at: DateTime<Local>,
        #[serde(flatten)]
        summary: RunSummary,
    },
}

/// Receives run start/finish notifications
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn run_started(&self, run: &TraceRun);

    async fn run_finished(&self, run: &TraceRun, summary: &RunSummary);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTraceSink;

#[async_trait]
impl TraceSink for NullTraceSink {
    async fn run_started(&self, _run: &TraceRun) {}

    async fn run_finished(&self, _run: &TraceRun, _summary: &RunSummary) {}
}

/// Keeps records in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Summaries of all finished runs
    pub fn finished(&self) -> Vec<RunSummary> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                TraceRecord::Finish { summary, .. } => Some(summary),
                TraceRecord::Start { .. } => None,
            })
            .collect()
    }

    fn push(&self, record: TraceRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

#[async_trait]
impl TraceSink for MemoryTraceSink {
    async fn run_started(&self, run: &TraceRun) {
        self.push(TraceRecord::Start { run: run.clone() });
    }

    async fn run_finished(&self, run: &TraceRun, summary: &RunSummary) {
        self.push(TraceRecord::Finish {
            run_id: run.id,
            finished_at: Local::now(),
            summary: summary.clone(),
        });
    }
}

/// Appends one JSON line per record to `trace-<local time>.jsonl`
pub struct JsonlTraceSink {
    file_path: PathBuf,
    file: tokio::sync::Mutex<tokio::fs::File>,
}

impl JsonlTraceSink {
    /// Create a new sink; the file name is derived from the current local time.
    pub async fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).await?;

        let filename = format!(
            "trace-{}.jsonl",
            Local::now().format("%Y-%m-%d-%H%M%S")
        );
        let file_path = dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self { file_path, file: tokio::sync::Mutex::new(file) })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    async fn write(&self, record: &TraceRecord) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("[Trace error] {}", e);
                return;
            }
        };
        let mut file = self.file.lock().await;
        if let Err(e) = file.write_all(format!("{}\n", json).as_bytes()).await {
            eprintln!("[Trace error] {}", e);
        } else if let Err(e) = file.flush().await {
            eprintln!("[Trace error] {}", e);
        }
    }
}

#[async_trait]
impl TraceSink for JsonlTraceSink {
    async fn run_started(&self, run: &TraceRun) {
        self.write(&TraceRecord::Start { run: run.clone() }).await;
    }

    async fn run_finished(&self, run: &TraceRun, summary: &RunSummary) {
        self.write(&TraceRecord::Finish {
            run_id: run.id,
            finished_at: Local::now(),
            summary: summary.clone(),
        })
        .await;
    }
}
