//! Session-id → conversation cache lookup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{ConversationCache, FileConversationCache, MemoryConversationCache};

/// Opens the conversation cache for a session.
pub trait ConversationStore: Send + Sync {
    fn open(&self, session_id: &str) -> Arc<dyn ConversationCache>;
}

/// Shared handle to a store.
pub type SharedConversationStore = Arc<dyn ConversationStore>;

/// One JSON file per session under a directory.
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    dir: PathBuf,
}

impl FileConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `session_id`.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(session_id)))
    }
}

impl ConversationStore for FileConversationStore {
    fn open(&self, session_id: &str) -> Arc<dyn ConversationCache> {
        Arc::new(FileConversationCache::new(self.path_for(session_id)))
    }
}

/// Map a session id to a file stem, one-to-one.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes
/// `%XX`. The empty id maps to `%`, which no other id can produce.
fn sanitize(session_id: &str) -> String {
    if session_id.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Per-session in-memory caches that live as long as the store.
#[derive(Default)]
pub struct MemoryConversationStore {
    sessions: Mutex<HashMap<String, Arc<MemoryConversationCache>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryConversationStore {
    fn open(&self, session_id: &str) -> Arc<dyn ConversationCache> {
        self.sessions
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermod_llm::Message;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("chat-1_a"), "chat-1_a");
        assert_eq!(sanitize("../../etc/passwd"), "%2E%2E%2F%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(sanitize("team.alpha"), "team%2Ealpha");
        assert_eq!(sanitize("50%"), "50%25");
        assert_eq!(sanitize("ß"), "%C3%9F");
        assert_eq!(sanitize(""), "%");
    }

    #[test]
    fn test_sanitize_is_injective() {
        let ids = [
            "team.alpha",
            "team_alpha",
            "team alpha",
            "team%2Ealpha",
            "",
            "%",
            "default",
            "a/b",
            "a_b",
        ];
        let stems: std::collections::HashSet<String> = ids.iter().map(|id| sanitize(id)).collect();
        assert_eq!(stems.len(), ids.len());
    }

    #[tokio::test]
    async fn test_file_store_isolates_sessions() {
        let dir = TempDir::new().unwrap();
        let store = FileConversationStore::new(dir.path());

        store.open("a").save_messages(&[Message::user("for a")]).await.unwrap();
        assert!(store.open("b").is_empty().await);
        assert_eq!(store.open("a").messages().await, vec![Message::user("for a")]);
        assert!(store.path_for("a").exists());
    }

    #[tokio::test]
    async fn test_file_store_keeps_similar_ids_apart() {
        let dir = TempDir::new().unwrap();
        let store = FileConversationStore::new(dir.path());
        assert_ne!(store.path_for("team.alpha"), store.path_for("team_alpha"));

        store
            .open("team.alpha")
            .save_messages(&[Message::user("dot")])
            .await
            .unwrap();
        store
            .open("team_alpha")
            .save_messages(&[Message::user("underscore")])
            .await
            .unwrap();

        assert_eq!(store.open("team.alpha").messages().await, vec![Message::user("dot")]);
        assert_eq!(
            store.open("team_alpha").messages().await,
            vec![Message::user("underscore")]
        );
        assert!(store.path_for("team.alpha").starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_memory_store_shares_cache_per_session() {
        let store = MemoryConversationStore::new();
        store.open("s").save_messages(&[Message::user("x")]).await.unwrap();
        assert_eq!(store.open("s").messages().await.len(), 1);
        assert!(store.open("other").is_empty().await);
    }
}
