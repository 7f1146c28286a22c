use std::path::PathBuf;

use crate::error::ConfigError;

/// Default database holding the agent object
pub const DEFAULT_AGENT_DATABASE: &str = "BOOKLY";

/// Default schema holding the agent object
pub const DEFAULT_AGENT_SCHEMA: &str = "SUPPORT";

/// Default agent object name
pub const DEFAULT_AGENT_NAME: &str = "BOOKLY_SUPPORT_AGENT";

/// Connection settings for a Cortex Agent run endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Account host (`myaccount.snowflakecomputing.com`) or a full base URL
    pub account_url: String,
    /// Bearer credential (programmatic access token)
    pub token: String,
    pub database: String,
    pub schema: String,
    pub agent_name: String,
    /// Echo requests, responses and stream events to the console
    pub verbose: bool,
    /// Write request/response logs into this directory
    pub log_dir: Option<PathBuf>,
}

impl AgentConfig {
    pub fn new(account_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account_url: account_url.into(),
            token: token.into(),
            database: DEFAULT_AGENT_DATABASE.to_string(),
            schema: DEFAULT_AGENT_SCHEMA.to_string(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            verbose: false,
            log_dir: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = agent_name.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }

    /// Check that every required value is present and non-blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account_url.trim().is_empty() {
            return Err(ConfigError::MissingAccountUrl);
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.agent_name.trim().is_empty() {
            return Err(ConfigError::MissingAgentName);
        }
        Ok(())
    }

    /// Base URL of the account, always with a scheme and without a trailing slash
    pub fn base_url(&self) -> String {
        let host = self.account_url.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    /// Full URL of the agent's `:run` endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/v2/databases/{}/schemas/{}/agents/{}:run",
            self.base_url(),
            self.database,
            self.schema,
            self.agent_name
        )
    }
}
