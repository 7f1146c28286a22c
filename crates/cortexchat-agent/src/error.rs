use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("account URL is not set (SNOWFLAKE_ACCOUNT_URL)")]
    MissingAccountUrl,
    #[error("access token is not set (SNOWFLAKE_PAT)")]
    MissingToken,
    #[error("agent name is not set (AGENT_NAME)")]
    MissingAgentName,
}

/// Failures that end a `send` call.
///
/// Malformed or unknown stream frames never show up here; they are skipped.
/// An `error` event from the agent is data, delivered as
/// `StreamChunk::Error`, not as an `AgentError`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Cortex Agent API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl AgentError {
    /// HTTP status carried by an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            AgentError::Api { status, .. } => Some(*status),
            AgentError::Transport(e) => e.status().map(|s| s.as_u16()),
            AgentError::Config(_) => None,
        }
    }

    /// A non-empty sentence suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Config(e) => format!("The assistant is not configured: {}.", e),
            AgentError::Transport(e) => format!("Could not reach the assistant: {}.", e),
            AgentError::Api { status, body } if body.trim().is_empty() => {
                format!("The assistant returned HTTP {} with no details.", status)
            }
            AgentError::Api { status, body } => {
                format!("The assistant returned HTTP {}: {}", status, body.trim())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_keeps_literal_body() {
        let err = AgentError::Api { status: 500, body: "server exploded".to_string() };
        assert_eq!(err.to_string(), "Cortex Agent API error 500: server exploded");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_user_message_never_empty() {
        let errors = vec![
            AgentError::Config(ConfigError::MissingToken),
            AgentError::Api { status: 502, body: String::new() },
            AgentError::Api { status: 400, body: "bad request".to_string() },
        ];
        for err in errors {
            assert!(!err.user_message().trim().is_empty(), "{:?}", err);
        }
        assert_eq!(
            AgentError::Api { status: 502, body: "  ".to_string() }.user_message(),
            "The assistant returned HTTP 502 with no details."
        );
    }

    #[test]
    fn test_config_error_converts() {
        let err: AgentError = ConfigError::MissingAccountUrl.into();
        assert!(matches!(err, AgentError::Config(ConfigError::MissingAccountUrl)));
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("SNOWFLAKE_ACCOUNT_URL"));
    }
}
