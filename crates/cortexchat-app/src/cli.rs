use clap::Parser;
use std::path::PathBuf;

use cortexchat_agent::{AgentConfig, DEFAULT_AGENT_DATABASE, DEFAULT_AGENT_NAME, DEFAULT_AGENT_SCHEMA};

/// CLI arguments for cortexchat
#[derive(Parser, Debug)]
#[command(name = "cortexchat")]
#[command(about = "Cortexchat - streaming support chat backed by a Snowflake Cortex Agent")]
#[command(version)]
pub struct Cli {
    /// Account host, e.g. myaccount.snowflakecomputing.com (a full http(s) URL also works)
    #[arg(long, env = "SNOWFLAKE_ACCOUNT_URL", value_name = "HOST")]
    pub account_url: Option<String>,

    /// Programmatic access token sent as the bearer credential
    #[arg(long, env = "SNOWFLAKE_PAT", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Database that holds the agent
    #[arg(long, env = "AGENT_DATABASE", default_value = DEFAULT_AGENT_DATABASE)]
    pub database: String,

    /// Schema that holds the agent
    #[arg(long, env = "AGENT_SCHEMA", default_value = DEFAULT_AGENT_SCHEMA)]
    pub schema: String,

    /// Name of the agent object (created with CREATE AGENT)
    #[arg(long, env = "AGENT_NAME", default_value = DEFAULT_AGENT_NAME)]
    pub agent_name: String,

    /// Send a single message, print the reply and exit
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Show the agent's reasoning as it streams
    #[arg(long)]
    pub show_thinking: bool,

    /// Print HTTP requests, responses and every stream event
    #[arg(short, long)]
    pub verbose: bool,

    /// Write request/response logs into this directory
    #[arg(long, env = "CORTEXCHAT_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append run traces (input, reply, tools used) as JSON lines into this directory
    #[arg(long, env = "CORTEXCHAT_TRACE_DIR", value_name = "DIR")]
    pub trace_dir: Option<PathBuf>,
}

impl Cli {
    /// Agent configuration; missing values surface later as a configuration error
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::new(
            self.account_url.clone().unwrap_or_default(),
            self.token.clone().unwrap_or_default(),
        )
        .with_database(self.database.clone())
        .with_schema(self.schema.clone())
        .with_agent_name(self.agent_name.clone())
        .with_verbose(self.verbose)
        .with_log_dir(self.log_dir.clone())
    }
}
