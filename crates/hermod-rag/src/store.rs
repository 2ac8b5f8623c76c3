//! Embeddings persistence.
//!
//! A store holds one [`DocumentEmbeddings`] record per ingested file, keyed
//! by file name. Saving a record for a name that already exists replaces it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default file name for the on-disk store.
pub const DEFAULT_STORE_FILE: &str = "embeddings_cache.json";

/// Everything indexed for one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEmbeddings {
    pub metadata: DocumentMetadata,
    pub chunks: Vec<EmbeddedChunk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub file_name: String,
    pub file_path: String,
    /// Ingestion time, epoch milliseconds.
    pub timestamp: i64,
    pub total_chunks: usize,
    pub tokens_per_chunk: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedChunk {
    pub id: String,
    pub text: String,
    pub word_count: usize,
    pub token_count: usize,
    /// Normalized embedding vector.
    pub embeddings: Vec<f32>,
}

/// Storage for document embeddings.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Insert or replace the record for `record.metadata.file_name`.
    async fn save(&self, record: DocumentEmbeddings) -> Result<()>;

    async fn get(&self, file_name: &str) -> Option<DocumentEmbeddings>;

    async fn all(&self) -> Vec<DocumentEmbeddings>;

    /// Returns whether a record was removed.
    async fn delete(&self, file_name: &str) -> Result<bool>;

    async fn is_empty(&self) -> bool {
        self.all().await.iter().all(|r| r.chunks.is_empty())
    }
}

/// Vector length of the first chunk, if the record has any.
fn dimensions(record: &DocumentEmbeddings) -> Option<usize> {
    record.chunks.first().map(|c| c.embeddings.len())
}

/// Every chunk of `record` must match the records it would sit beside.
///
/// The record it replaces (same file name) is not compared, so re-indexing
/// the only document with a new embedding model is allowed.
fn check_dimensions(records: &[DocumentEmbeddings], record: &DocumentEmbeddings) -> Result<()> {
    let Some(actual) = dimensions(record) else {
        return Ok(());
    };
    if let Some(chunk) = record.chunks.iter().find(|c| c.embeddings.len() != actual) {
        return Err(RagError::DimensionMismatch {
            expected: actual,
            actual: chunk.embeddings.len(),
        });
    }

    let expected = records
        .iter()
        .filter(|r| r.metadata.file_name != record.metadata.file_name)
        .find_map(dimensions);
    match expected {
        Some(expected) if expected != actual => {
            Err(RagError::DimensionMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

fn upsert(records: &mut Vec<DocumentEmbeddings>, record: DocumentEmbeddings) -> Result<()> {
    check_dimensions(records, &record)?;
    records.retain(|r| r.metadata.file_name != record.metadata.file_name);
    records.push(record);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// File store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    results: Vec<DocumentEmbeddings>,
}

/// All records in a single JSON file, `{"results": [...]}`.
///
/// Every write rewrites the whole file. Writers are serialized so concurrent
/// saves cannot drop each other's records.
#[derive(Debug)]
pub struct FileEmbeddingStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileEmbeddingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `<dir>/embeddings_cache.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Vec<DocumentEmbeddings> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to read embeddings store");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<StoreDocument>(&raw) {
            Ok(doc) => doc.results,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "unreadable embeddings store");
                Vec::new()
            }
        }
    }

    async fn persist(&self, results: Vec<DocumentEmbeddings>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| RagError::store(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(&StoreDocument { results })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| RagError::store(&self.path, e))
    }
}

#[async_trait]
impl EmbeddingStore for FileEmbeddingStore {
    async fn save(&self, record: DocumentEmbeddings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let file_name = record.metadata.file_name.clone();
        let chunks = record.chunks.len();

        let mut results = self.load().await;
        upsert(&mut results, record)?;
        self.persist(results).await?;

        tracing::info!(file = %file_name, chunks, path = %self.path.display(), "saved embeddings");
        Ok(())
    }

    async fn get(&self, file_name: &str) -> Option<DocumentEmbeddings> {
        self.load()
            .await
            .into_iter()
            .find(|r| r.metadata.file_name == file_name)
    }

    async fn all(&self) -> Vec<DocumentEmbeddings> {
        self.load().await
    }

    async fn delete(&self, file_name: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut results = self.load().await;
        let before = results.len();
        results.retain(|r| r.metadata.file_name != file_name);
        if results.len() == before {
            return Ok(false);
        }
        self.persist(results).await?;
        Ok(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryEmbeddingStore {
    records: RwLock<Vec<DocumentEmbeddings>>,
}

impl MemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn save(&self, record: DocumentEmbeddings) -> Result<()> {
        upsert(&mut self.records.write(), record)
    }

    async fn get(&self, file_name: &str) -> Option<DocumentEmbeddings> {
        self.records
            .read()
            .iter()
            .find(|r| r.metadata.file_name == file_name)
            .cloned()
    }

    async fn all(&self) -> Vec<DocumentEmbeddings> {
        self.records.read().clone()
    }

    async fn delete(&self, file_name: &str) -> Result<bool> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.metadata.file_name != file_name);
        Ok(records.len() != before)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn record(file_name: &str, texts: &[(&str, Vec<f32>)]) -> DocumentEmbeddings {
        DocumentEmbeddings {
            metadata: DocumentMetadata {
                file_name: file_name.to_string(),
                file_path: format!("/docs/{file_name}"),
                timestamp: 1_700_000_000_000,
                total_chunks: texts.len(),
                tokens_per_chunk: 50,
            },
            chunks: texts
                .iter()
                .enumerate()
                .map(|(i, (text, v))| EmbeddedChunk {
                    id: format!("chunk_{}", i + 1),
                    text: text.to_string(),
                    word_count: text.split_whitespace().count(),
                    token_count: 1,
                    embeddings: v.clone(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_file_store_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path());
        assert!(store.is_empty().await);
        assert!(store.get("a.txt").await.is_none());
        assert!(!store.delete("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_replaces_same_file_name() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path().join("rag"));

        store.save(record("a.txt", &[("old", vec![1.0])])).await.unwrap();
        store.save(record("b.txt", &[("bee", vec![0.5])])).await.unwrap();
        store.save(record("a.txt", &[("new", vec![-1.0])])).await.unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(store.get("a.txt").await.unwrap().chunks[0].text, "new");
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_store_on_disk_shape() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path());
        store.save(record("a.txt", &[("alpha", vec![0.25])])).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let result = &raw["results"][0];
        assert_eq!(result["metadata"]["fileName"], "a.txt");
        assert_eq!(result["metadata"]["totalChunks"], 1);
        assert_eq!(result["metadata"]["tokensPerChunk"], 50);
        assert_eq!(result["chunks"][0]["id"], "chunk_1");
        assert_eq!(result["chunks"][0]["wordCount"], 1);
        assert_eq!(result["chunks"][0]["embeddings"][0], 0.25);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path());
        std::fs::write(store.path(), "{\"results\": [oops").unwrap();
        assert!(store.all().await.is_empty());

        store.save(record("a.txt", &[("x", vec![1.0])])).await.unwrap();
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path());
        store.save(record("a.txt", &[("x", vec![1.0])])).await.unwrap();
        assert!(store.delete("a.txt").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryEmbeddingStore::new();
        assert!(store.is_empty().await);

        store.save(record("a.txt", &[("x", vec![1.0])])).await.unwrap();
        store.save(record("a.txt", &[("y", vec![1.0]), ("z", vec![0.0])])).await.unwrap();
        assert_eq!(store.all().await.len(), 1);
        assert_eq!(store.get("a.txt").await.unwrap().chunks.len(), 2);

        assert!(store.delete("a.txt").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_dimension_mismatch() {
        let store = MemoryEmbeddingStore::new();
        store.save(record("a.txt", &[("x", vec![1.0, 0.0, 0.0])])).await.unwrap();

        let err = store
            .save(record("b.txt", &[("y", vec![0.1; 768])]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 768
            }
        ));
        assert!(store.get("b.txt").await.is_none());

        let err = store
            .save(record("c.txt", &[("p", vec![1.0, 0.0, 0.0]), ("q", vec![1.0])]))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));

        // Replacing the only record may change the model.
        store.save(record("a.txt", &[("z", vec![0.5; 768])])).await.unwrap();
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_rejects_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let store = FileEmbeddingStore::in_dir(dir.path());
        store.save(record("a.txt", &[("x", vec![1.0, 0.0, 0.0])])).await.unwrap();
        store.save(record("b.txt", &[("y", vec![0.0, 1.0, 0.0])])).await.unwrap();

        let err = store
            .save(record("c.txt", &[("z", vec![0.1; 768])]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 768
            }
        ));
        assert_eq!(store.all().await.len(), 2);
        assert!(store.get("c.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_records_without_chunks_count_as_empty() {
        let store = MemoryEmbeddingStore::new();
        store.save(record("empty.txt", &[])).await.unwrap();
        assert!(store.is_empty().await);
    }
}
