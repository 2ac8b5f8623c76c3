//! Conversation caches: one ordered message list per session.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hermod_llm::Message;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Durable storage for a single conversation.
///
/// Writes are full overwrites; there is no append.
#[async_trait]
pub trait ConversationCache: Send + Sync {
    /// The stored conversation, oldest first. Empty when nothing is stored.
    async fn messages(&self) -> Vec<Message>;

    /// Replace the stored conversation.
    async fn save_messages(&self, messages: &[Message]) -> Result<()>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;

    async fn is_empty(&self) -> bool {
        self.messages().await.is_empty()
    }
}

/// On-disk document shape.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    messages: Vec<Message>,
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed cache
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation stored as `{"messages": [...]}` in one JSON file.
///
/// Missing, blank or unreadable files read as an empty conversation.
#[derive(Debug, Clone)]
pub struct FileConversationCache {
    path: PathBuf,
}

impl FileConversationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, document: &CacheDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| SessionError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SessionError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SessionError::io(&self.path, e))
    }
}

#[async_trait]
impl ConversationCache for FileConversationCache {
    async fn messages(&self) -> Vec<Message> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read conversation cache");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<CacheDocument>(&raw) {
            Ok(document) => document.messages,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt conversation cache, starting fresh"
                );
                Vec::new()
            }
        }
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<()> {
        self.write(&CacheDocument {
            messages: messages.to_vec(),
        })
        .await?;
        tracing::debug!(path = %self.path.display(), count = messages.len(), "saved conversation");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::io(&self.path, e)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory cache
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation held in process memory.
#[derive(Debug, Default)]
pub struct MemoryConversationCache {
    messages: RwLock<Vec<Message>>,
}

impl MemoryConversationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: RwLock::new(messages),
        }
    }
}

#[async_trait]
impl ConversationCache for MemoryConversationCache {
    async fn messages(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    async fn save_messages(&self, messages: &[Message]) -> Result<()> {
        *self.messages.write() = messages.to_vec();
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.messages.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermod_llm::Role;
    use tempfile::TempDir;

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("You are helpful."),
            Message::user("hi"),
            Message::assistant("hello"),
        ]
    }

    #[tokio::test]
    async fn test_file_cache_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = FileConversationCache::new(dir.path().join("nope.json"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_cache_roundtrip_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("s.json");
        let cache = FileConversationCache::new(&path);

        cache.save_messages(&conversation()).await.unwrap();
        assert!(path.exists());

        let loaded = cache.messages().await;
        assert_eq!(loaded, conversation());
        assert_eq!(loaded[0].role, Role::System);
    }

    #[tokio::test]
    async fn test_file_cache_overwrites() {
        let dir = TempDir::new().unwrap();
        let cache = FileConversationCache::new(dir.path().join("s.json"));

        cache.save_messages(&conversation()).await.unwrap();
        cache.save_messages(&[Message::user("only")]).await.unwrap();
        assert_eq!(cache.messages().await, vec![Message::user("only")]);
    }

    #[tokio::test]
    async fn test_file_cache_on_disk_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        let cache = FileConversationCache::new(&path);
        cache.save_messages(&[Message::user("ping")]).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"messages": [{"role": "user", "text": "ping"}]}));
    }

    #[tokio::test]
    async fn test_file_cache_corrupt_or_blank_reads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");

        std::fs::write(&path, "{ this is not json").unwrap();
        let cache = FileConversationCache::new(&path);
        assert!(cache.messages().await.is_empty());

        std::fs::write(&path, "   \n").unwrap();
        assert!(cache.messages().await.is_empty());

        // a corrupt file is replaced by the next save
        cache.save_messages(&[Message::user("fresh")]).await.unwrap();
        assert_eq!(cache.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_cache_clear() {
        let dir = TempDir::new().unwrap();
        let cache = FileConversationCache::new(dir.path().join("s.json"));
        cache.clear().await.unwrap();

        cache.save_messages(&conversation()).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_cache() {
        let cache = MemoryConversationCache::new();
        assert!(cache.is_empty().await);

        cache.save_messages(&conversation()).await.unwrap();
        assert_eq!(cache.messages().await.len(), 3);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
