//! Error types for retrieval operations.

use hermod_llm::LlmError;
use thiserror::Error;

/// Result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Error type for retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    /// Reading or writing the embeddings store failed.
    #[error("store I/O error on {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Nothing to ingest.
    #[error("document '{0}' has no text to index")]
    EmptyDocument(String),

    /// Embedding vectors of different lengths cannot be compared.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl RagError {
    pub(crate) fn store(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Store {
            path: path.display().to_string(),
            source,
        }
    }
}
