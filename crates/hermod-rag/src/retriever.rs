//! Query-time retrieval: vector search, optional reranking, context formatting.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::future::join_all;
use hermod_llm::SharedEmbedder;

use crate::error::Result;
use crate::rerank::SharedReranker;
use crate::store::EmbeddingStore;
use crate::vector::{cosine_similarity, normalize};

pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_TOP_N: usize = 5;

/// A chunk selected for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub file_name: String,
    pub chunk_id: String,
    pub text: String,
    /// Cosine similarity to the query.
    pub similarity: f32,
    /// Reranker score, when reranking ran.
    pub relevance: Option<f32>,
}

/// Finds the stored chunks most relevant to a query.
pub struct Retriever {
    embedder: SharedEmbedder,
    store: Arc<dyn EmbeddingStore>,
    reranker: Option<SharedReranker>,
    top_k: usize,
    top_n: usize,
}

impl Retriever {
    pub fn new(embedder: SharedEmbedder, store: Arc<dyn EmbeddingStore>) -> Self {
        Self {
            embedder,
            store,
            reranker: None,
            top_k: DEFAULT_TOP_K,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Enable reranking of the top-K candidates.
    pub fn with_reranker(mut self, reranker: SharedReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn reranks(&self) -> bool {
        self.reranker.is_some()
    }

    /// Up to `top_n` chunks for `query`, best first.
    ///
    /// An empty store short-circuits before the query is embedded.
    pub async fn search(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        if self.store.is_empty().await {
            tracing::debug!("embeddings store is empty, skipping retrieval");
            return Ok(Vec::new());
        }

        let query_vector = normalize(&self.embedder.embed(query).await?);

        let mut candidates: Vec<RetrievedChunk> = self
            .store
            .all()
            .await
            .into_iter()
            .flat_map(|record| {
                let file_name = record.metadata.file_name;
                let query_vector = &query_vector;
                record.chunks.into_iter().map(move |chunk| RetrievedChunk {
                    file_name: file_name.clone(),
                    similarity: cosine_similarity(query_vector, &chunk.embeddings),
                    chunk_id: chunk.id,
                    text: chunk.text,
                    relevance: None,
                })
            })
            .collect();

        candidates.sort_by(|a, b| descending(a.similarity, b.similarity));
        candidates.truncate(self.top_k);

        let Some(reranker) = &self.reranker else {
            candidates.truncate(self.top_n);
            return Ok(candidates);
        };

        let scores = join_all(
            candidates
                .iter()
                .map(|c| reranker.score(query, &c.text)),
        )
        .await;
        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.relevance = Some(score);
        }

        candidates.sort_by(|a, b| {
            descending(a.relevance.unwrap_or(0.0), b.relevance.unwrap_or(0.0))
        });
        candidates.truncate(self.top_n);

        tracing::debug!(
            selected = candidates.len(),
            top_relevance = ?candidates.first().and_then(|c| c.relevance),
            "reranked retrieval candidates"
        );
        Ok(candidates)
    }

    /// Formatted context block for `query`, or `None` when nothing was found.
    pub async fn retrieve(&self, query: &str) -> Result<Option<String>> {
        let chunks = self.search(query).await?;
        if chunks.is_empty() {
            return Ok(None);
        }
        tracing::info!(chunks = chunks.len(), "retrieved context");
        Ok(Some(format_context(&chunks)))
    }
}

fn descending(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Render chunks as a prompt section.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    let mut out = String::from("=== RELEVANT CONTEXT FROM KNOWLEDGE BASE ===\n\n");
    out.push_str("Use the following information to answer the user's question:\n\n");

    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!("--- Fragment {} ---\n{}\n\n", i + 1, chunk.text));
    }

    out.push_str("=== END OF CONTEXT ===\n\n");
    out.push_str(
        "IMPORTANT: Base your answer on the context above. If it does not contain \
         enough information, you may use your own knowledge, but prefer the context.",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rerank::{NEUTRAL_SCORE, Reranker};
    use crate::store::MemoryEmbeddingStore;
    use crate::store::tests::record;
    use async_trait::async_trait;
    use hermod_llm::{Embedder, LlmError};
    use parking_lot::Mutex;

    /// Returns a fixed vector for every query and counts calls.
    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: Mutex<usize>,
    }

    impl FixedEmbedder {
        fn new(vector: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                vector,
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> hermod_llm::Result<Vec<f32>> {
            *self.calls.lock() += 1;
            Ok(self.vector.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        async fn embed(&self, _text: &str) -> hermod_llm::Result<Vec<f32>> {
            Err(LlmError::Network("embedding service unreachable".to_string()))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    /// Scores by substring lookup; unknown chunks get the neutral score.
    struct TableReranker(Vec<(&'static str, f32)>);

    #[async_trait]
    impl Reranker for TableReranker {
        async fn score(&self, _query: &str, chunk: &str) -> f32 {
            self.0
                .iter()
                .find(|(needle, _)| chunk.contains(needle))
                .map(|(_, s)| *s)
                .unwrap_or(NEUTRAL_SCORE)
        }
    }

    async fn populated_store() -> Arc<MemoryEmbeddingStore> {
        let store = Arc::new(MemoryEmbeddingStore::new());
        store
            .save(record(
                "a.txt",
                &[
                    ("north", vec![1.0, 0.0, 0.0]),
                    ("mostly north", vec![0.9, 0.1, 0.0]),
                    ("east", vec![0.0, 1.0, 0.0]),
                ],
            ))
            .await
            .unwrap();
        store
            .save(record("b.txt", &[("up", vec![0.0, 0.0, 1.0]), ("northeast", vec![0.7, 0.7, 0.0])]))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_empty_store_returns_none_without_embedding() {
        let embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
        let retriever = Retriever::new(embedder.clone(), Arc::new(MemoryEmbeddingStore::new()));

        assert_eq!(retriever.retrieve("anything").await.unwrap(), None);
        assert_eq!(*embedder.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let retriever = Retriever::new(Arc::new(DownEmbedder), populated_store().await);
        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, crate::RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity_and_truncates() {
        // query leans north with a little east; normalize keeps that ordering
        let retriever = Retriever::new(FixedEmbedder::new(vec![1.0, 0.2, 0.0]), populated_store().await)
            .with_top_n(3);

        let hits = retriever.search("which way").await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(hits.iter().all(|h| h.relevance.is_none()));
        assert!(hits.iter().all(|h| h.text != "up"));
    }

    #[tokio::test]
    async fn test_rerank_reorders_and_keeps_unparsable_at_neutral() {
        let reranker = Arc::new(TableReranker(vec![("east", 0.95), ("mostly", 0.1)]));
        let retriever = Retriever::new(FixedEmbedder::new(vec![1.0, 0.2, 0.0]), populated_store().await)
            .with_top_k(5)
            .with_top_n(3)
            .with_reranker(reranker);

        let hits = retriever.search("q").await.unwrap();
        assert_eq!(hits.len(), 3);
        // "east" and "northeast" both match the high score, then neutral ones
        assert_eq!(hits[0].relevance, Some(0.95));
        assert_eq!(hits[1].relevance, Some(0.95));
        assert_eq!(hits[2].relevance, Some(NEUTRAL_SCORE));
        assert!(hits.iter().all(|h| h.text != "mostly north"));
    }

    #[tokio::test]
    async fn test_retrieve_formats_fragments() {
        let retriever = Retriever::new(FixedEmbedder::new(vec![0.0, 0.1, 1.0]), populated_store().await)
            .with_top_n(2);

        let context = retriever.retrieve("q").await.unwrap().unwrap();
        assert!(context.starts_with("=== RELEVANT CONTEXT FROM KNOWLEDGE BASE ===\n\n"));
        assert!(context.contains("--- Fragment 1 ---\nup\n\n"));
        assert!(context.contains("--- Fragment 2 ---\n"));
        assert!(!context.contains("--- Fragment 3 ---"));
        assert!(context.contains("=== END OF CONTEXT ==="));
        assert!(context.trim_end().ends_with("prefer the context."));
    }

    #[test]
    fn test_format_context_numbering() {
        let chunk = |text: &str| RetrievedChunk {
            file_name: "f".to_string(),
            chunk_id: "chunk_1".to_string(),
            text: text.to_string(),
            similarity: 1.0,
            relevance: None,
        };
        let out = format_context(&[chunk("alpha"), chunk("beta")]);
        let alpha = out.find("--- Fragment 1 ---\nalpha").unwrap();
        let beta = out.find("--- Fragment 2 ---\nbeta").unwrap();
        assert!(alpha < beta);
    }
}
