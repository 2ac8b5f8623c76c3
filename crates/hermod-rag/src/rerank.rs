//! Relevance reranking of retrieval candidates.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use hermod_llm::{CompletionRequest, Message, SharedBackend};
use regex::Regex;

/// Score used when the model's answer cannot be used.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Model asked for relevance scores by default.
pub const DEFAULT_RERANK_MODEL: &str = "llama3.2";

static SCORE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-1](?:\.[0-9]+)?").ok());

/// Scores how well a chunk answers a query, in `[0, 1]`.
///
/// Implementations never fail; anything unusable scores [`NEUTRAL_SCORE`].
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, chunk: &str) -> f32;
}

pub type SharedReranker = Arc<dyn Reranker>;

/// Asks a chat model for a single relevance number.
pub struct LlmReranker {
    backend: SharedBackend,
    model: Option<String>,
}

impl LlmReranker {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn request(&self, query: &str, chunk: &str) -> CompletionRequest {
        let request = CompletionRequest::new(vec![Message::user(rerank_prompt(query, chunk))])
            .with_temperature(0.0)
            .with_max_tokens(10);
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn score(&self, query: &str, chunk: &str) -> f32 {
        match self.backend.complete(self.request(query, chunk)).await {
            Ok(response) => parse_score(&response.text).unwrap_or_else(|| {
                tracing::warn!(output = %response.text.trim(), "unparsable rerank score");
                NEUTRAL_SCORE
            }),
            Err(e) => {
                tracing::warn!(error = %e, backend = %self.backend.name(), "rerank request failed");
                NEUTRAL_SCORE
            }
        }
    }
}

fn rerank_prompt(query: &str, chunk: &str) -> String {
    format!(
        "Rate how relevant the text fragment is to the user's question.\n\
         Reply with ONLY a number from 0.0 to 1.0, where:\n\
         - 1.0: the fragment fully answers the question\n\
         - 0.5: the fragment is partially relevant\n\
         - 0.0: the fragment is not relevant\n\n\
         Question: {query}\n\n\
         Fragment: {chunk}\n\n\
         Score:"
    )
}

/// First `0`/`1`-led decimal in `output`, clamped to `[0, 1]`.
pub fn parse_score(output: &str) -> Option<f32> {
    let found = SCORE_PATTERN.as_ref()?.find(output.trim())?;
    let value: f32 = found.as_str().parse().ok()?;
    Some(value.clamp(0.0, 1.0))
}
