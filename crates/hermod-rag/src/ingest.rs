//! Document ingestion: chunk, embed, normalize, store.

use std::path::Path;
use std::sync::Arc;

use hermod_llm::SharedEmbedder;

use crate::chunk::Chunker;
use crate::error::{RagError, Result};
use crate::store::{DocumentEmbeddings, DocumentMetadata, EmbeddedChunk, EmbeddingStore};
use crate::vector::normalize;

/// Turns documents into stored, searchable chunks.
pub struct Ingestor {
    embedder: SharedEmbedder,
    store: Arc<dyn EmbeddingStore>,
    chunker: Chunker,
}

impl Ingestor {
    pub fn new(embedder: SharedEmbedder, store: Arc<dyn EmbeddingStore>) -> Self {
        Self {
            embedder,
            store,
            chunker: Chunker::default(),
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Index `text` under `file_name`, replacing any earlier record for it.
    ///
    /// Chunks are embedded one at a time; the first embedding failure aborts
    /// the whole ingest and nothing is saved. Every chunk must embed to the
    /// same length as the first.
    pub async fn ingest(
        &self,
        text: &str,
        file_name: &str,
        file_path: &str,
    ) -> Result<DocumentEmbeddings> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument(file_name.to_string()));
        }

        tracing::info!(
            file = %file_name,
            chunks = chunks.len(),
            embedder = %self.embedder.name(),
            "ingesting document"
        );

        let mut embedded = Vec::with_capacity(chunks.len());
        let mut dims = None;
        for chunk in chunks {
            let raw = self.embedder.embed(&chunk.text).await?;
            tracing::debug!(chunk = %chunk.id, dims = raw.len(), "embedded chunk");
            let expected = *dims.get_or_insert(raw.len());
            if raw.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: raw.len(),
                });
            }
            embedded.push(EmbeddedChunk {
                id: chunk.id,
                text: chunk.text,
                word_count: chunk.word_count,
                token_count: chunk.token_count,
                embeddings: normalize(&raw),
            });
        }

        let record = DocumentEmbeddings {
            metadata: DocumentMetadata {
                file_name: file_name.to_string(),
                file_path: file_path.to_string(),
                timestamp: chrono::Utc::now().timestamp_millis(),
                total_chunks: embedded.len(),
                tokens_per_chunk: self.chunker.chunk_tokens(),
            },
            chunks: embedded,
        };

        self.store.save(record.clone()).await?;
        Ok(record)
    }

    /// Read a UTF-8 file and ingest it under its file name.
    pub async fn ingest_file(&self, path: impl AsRef<Path>) -> Result<DocumentEmbeddings> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RagError::store(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest(&text, &file_name, &path.display().to_string())
            .await
    }
}
