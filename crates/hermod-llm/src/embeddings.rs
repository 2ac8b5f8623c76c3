//! Text embeddings for retrieval.
//!
//! # Implementations
//!
//! - [`MockEmbedder`]: deterministic vectors for tests
//! - [`OllamaEmbedder`]: a local Ollama server's `/api/embeddings`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::ollama::DEFAULT_OLLAMA_URL;

/// Default embedding model served by Ollama.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

// ─────────────────────────────────────────────────────────────────────────────
// Embedder Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Converts text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the name of this embedder.
    fn name(&self) -> &str;
}

/// A shared embedder that can be used across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic embeddings derived from a hash of the text.
///
/// Identical texts always map to identical vectors, which is enough to test
/// retrieval ordering without a model.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut state = simple_hash(text);
        let embedding = (0..self.dimensions)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                ((state >> 16) as u16 as f32 / 32768.0) - 1.0
            })
            .collect();
        Ok(embedding)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn simple_hash(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    hash
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for [`OllamaEmbedder`].
#[derive(Debug, Clone)]
pub struct OllamaEmbedderConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OllamaEmbedderConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Embeddings from a local Ollama server.
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaEmbedderConfig,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.config.base_url)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };

        let response = self
            .client
            .post(self.embeddings_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Backend(format!(
                "Embedding request failed: HTTP {} - {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {}", e)))?;

        Ok(result.embedding.into_iter().map(|x| x as f32).collect())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Which embedder to build, as read from configuration.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "ollama" or "mock".
    pub provider: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Dimensions for the mock provider.
    pub dimensions: Option<usize>,
}

/// Build a [`SharedEmbedder`] from a spec.
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    match spec.provider.as_str() {
        "ollama" | "" => {
            let mut config = OllamaEmbedderConfig::default();
            if let Some(ref url) = spec.base_url {
                config = config.with_base_url(url);
            }
            if let Some(ref model) = spec.model {
                config = config.with_model(model);
            }
            Ok(Arc::new(OllamaEmbedder::new(config)?))
        }
        "mock" => Ok(Arc::new(MockEmbedder::new(spec.dimensions.unwrap_or(64)))),
        other => Err(LlmError::Config(format!(
            "unknown embedding provider '{}' (rag.embedding_provider must be 'ollama' or 'mock')",
            other
        ))),
    }
}
