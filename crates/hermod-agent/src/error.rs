//! Error types for the agent crate.

use thiserror::Error;

/// Result type alias using the agent error type.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type for agent operations.
///
/// Tool failures never show up here: they are reported back to the model as
/// text and the turn carries on.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Model backend error. The turn is abandoned and nothing is persisted.
    #[error("LLM error: {0}")]
    Llm(#[from] hermod_llm::LlmError),

    /// Conversation cache error.
    #[error("Session error: {0}")]
    Session(#[from] hermod_session::SessionError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::config("model backend is required");
        assert_eq!(err.to_string(), "Configuration error: model backend is required");

        let err: AgentError = hermod_llm::LlmError::Network("timed out".to_string()).into();
        assert!(err.to_string().contains("timed out"));
    }
}
