//! Error types for conversation cache operations.

/// Error type for conversation cache operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The conversation could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for conversation cache operations.
pub type Result<T> = std::result::Result<T, SessionError>;
