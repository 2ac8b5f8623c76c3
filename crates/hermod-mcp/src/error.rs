//! Error types for MCP operations.

use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for MCP operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to reach or talk to a tool provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON-RPC traffic.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("server error {code}: {message}")]
    Server {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// No provider in the current catalog owns this tool.
    #[error("tool '{0}' not found in any MCP provider")]
    ToolNotFound(String),

    /// The owning provider failed while executing the tool.
    #[error("error calling tool '{tool}' on provider {provider}: {message}")]
    ToolExecution {
        /// Identity of the provider that owns the tool.
        provider: String,
        /// Tool name.
        tool: String,
        /// Underlying failure.
        message: String,
    },

    /// The tool ran but reported an error result (`isError: true`).
    #[error("{message}")]
    ToolFailed {
        /// Tool name.
        tool: String,
        /// Human-readable error text returned by the tool.
        message: String,
    },

    /// A tool handler failed inside the local server.
    #[error("handler error: {0}")]
    Handler(String),
}

impl McpError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a handler error.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }

    /// Create a server error from an error response.
    pub fn server(code: i64, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::Server {
            code,
            message: message.into(),
            data,
        }
    }

    /// Returns true if the model can recover from this error conversationally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_) | Self::ToolExecution { .. } | Self::ToolFailed { .. }
        )
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            McpError::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            McpError::Transport(format!("connection failed: {}", err))
        } else {
            McpError::Transport(err.to_string())
        }
    }
}
