use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use clap::Parser;

use cortexchat_agent::StreamingSession;
use cortexchat_logging::{JsonlTraceSink, NullTraceSink, TraceSink};

mod app;
mod cli;

use app::{run_query_mode, run_repl_mode};
use cli::Cli;

async fn build_tracer(cli: &Cli) -> Arc<dyn TraceSink> {
    let Some(dir) = &cli.trace_dir else {
        return Arc::new(NullTraceSink);
    };
    match JsonlTraceSink::new(dir).await {
        Ok(sink) => {
            if cli.verbose {
                println!("{}", format!("📝 Tracing runs to: {}", sink.file_path().display()).bright_blue());
            }
            Arc::new(sink)
        }
        Err(e) => {
            eprintln!("Tracing disabled: {}", e);
            Arc::new(NullTraceSink)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let session = StreamingSession::new(cli.agent_config())
        .context("Set SNOWFLAKE_ACCOUNT_URL and SNOWFLAKE_PAT (in the environment or .env) before starting")?
        .with_tracer(build_tracer(&cli).await);

    if let Some(query) = cli.query.clone() {
        return run_query_mode(&cli, session, &query).await;
    }

    run_repl_mode(&cli, session).await
}
