//! A JSON array persisted in a single file.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::error::{ToolError, ToolResult};

/// Read-modify-write access to a `Vec<T>` stored as pretty JSON.
///
/// A missing or empty file reads as an empty list. A file that does not
/// parse is logged and also read as empty.
#[derive(Debug)]
pub struct JsonListFile<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonListFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> ToolResult<Vec<T>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ToolError::storage(&self.path, e)),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable store file");
                Ok(Vec::new())
            }
        }
    }

    /// Append `item` and rewrite the file.
    pub async fn push(&self, item: T) -> ToolResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await?;
        items.push(item);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::storage(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&items)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ToolError::storage(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_and_empty_files_read_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonListFile<String> = JsonListFile::new(dir.path().join("nope.json"));
        assert!(file.load().await.unwrap().is_empty());

        std::fs::write(dir.path().join("blank.json"), "  \n").unwrap();
        let blank: JsonListFile<String> = JsonListFile::new(dir.path().join("blank.json"));
        assert!(blank.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not a list").unwrap();
        let file: JsonListFile<String> = JsonListFile::new(&path);
        assert!(file.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonListFile::new(dir.path().join("nested/items.json"));
        file.push("a".to_string()).await.unwrap();
        file.push("b".to_string()).await.unwrap();
        assert_eq!(file.load().await.unwrap(), vec!["a", "b"]);
    }
}
