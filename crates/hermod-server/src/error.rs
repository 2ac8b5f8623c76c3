//! Error types for the tool server.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hermod_config::GIT_REPO_PATH_ENV;
use serde::Serialize;
use thiserror::Error;

/// Failures of the HTTP layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Invalid bind address: {0}")]
    Address(String),

    #[error("Encoding error: {0}")]
    Encode(#[from] hermod_mcp::McpError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::Address(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        tracing::error!(error = %self, "request failed");
        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures inside a tool. These never reach the JSON-RPC layer as errors;
/// the service turns them into `isError` results.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("calculation error: {0}")]
    Calculation(String),

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("no forecast available for {0}")]
    NoForecast(String),

    #[error("weather service error: {0}")]
    Weather(String),

    #[error(
        "Git repository is not configured: set {} or server.git_repo_path",
        GIT_REPO_PATH_ENV
    )]
    GitNotConfigured,

    #[error("Git repository directory does not exist: {}", .0.display())]
    GitRepoMissing(PathBuf),

    #[error("git {command} failed with exit code {code}: {output}")]
    GitCommand {
        command: String,
        code: i32,
        output: String,
    },

    #[error("failed to run git: {0}")]
    GitSpawn(#[source] std::io::Error),

    #[error("storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        Self::Weather(e.to_string())
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
