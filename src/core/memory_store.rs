use crate::core::store::{StoredFile, TextStore, VersionToken, WriteReceipt};
use crate::error::store::{Result, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory `TextStore` with the same compare-and-swap rules as GitHub.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, (Vec<u8>, VersionToken)>>,
    calls: Mutex<Vec<String>>,
    unavailable: Mutex<HashSet<String>>,
    next_version: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self) -> VersionToken {
        let n = self.next_version.fetch_add(1, Ordering::Relaxed) + 1;
        VersionToken::new(format!("sha{}", n))
    }

    pub fn insert(&self, path: &str, content: &[u8]) -> VersionToken {
        let version = self.bump_version();
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (content.to_vec(), version.clone()));
        version
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|(c, _)| c.clone())
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path).map(|c| String::from_utf8(c).unwrap())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    /// Every later call touching `path` fails as if GitHub were down.
    pub fn make_unavailable(&self, path: &str) {
        self.unavailable.lock().unwrap().insert(path.to_string());
    }

    /// `"read <path>"`, `"write <path>"`, `"delete <path>"` in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, path: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{} {}", op, path));
        if self.unavailable.lock().unwrap().contains(path) {
            return Err(StoreError::RemoteUnavailable {
                status: Some(503),
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TextStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<StoredFile> {
        self.record("read", path)?;
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|(content, version)| StoredFile {
                content: content.clone(),
                version: version.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(
        &self,
        path: &str,
        content: &[u8],
        _message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<WriteReceipt> {
        self.record("write", path)?;
        let mut files = self.files.lock().unwrap();
        match (files.get(path), expected) {
            (Some(_), None) => return Err(StoreError::AlreadyExists(path.to_string())),
            (None, Some(_)) => return Err(StoreError::NotFound(path.to_string())),
            (Some((_, current)), Some(expected)) if current != expected => {
                return Err(StoreError::Conflict(path.to_string()));
            }
            _ => {}
        }
        let version = self.bump_version();
        files.insert(path.to_string(), (content.to_vec(), version.clone()));
        Ok(WriteReceipt {
            commit: format!("commit-{}", version),
            version,
        })
    }

    async fn delete(&self, path: &str, _message: &str, expected: &VersionToken) -> Result<String> {
        self.record("delete", path)?;
        let mut files = self.files.lock().unwrap();
        match files.get(path) {
            None => Err(StoreError::NotFound(path.to_string())),
            Some((_, current)) if current != expected => Err(StoreError::Conflict(path.to_string())),
            Some(_) => {
                files.remove(path);
                Ok(format!("commit-delete-{}", expected))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_token_conflicts() {
        let store = MemoryStore::new();
        let first = store.insert("a.txt", b"one");
        store.write("a.txt", b"two", "m", Some(&first)).await.unwrap();

        let err = store.write("a.txt", b"three", "m", Some(&first)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.text("a.txt").unwrap(), "two");
    }

    #[tokio::test]
    async fn create_on_occupied_path_fails() {
        let store = MemoryStore::new();
        store.insert("a.txt", b"one");
        let err = store.write("a.txt", b"two", "m", None).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete("gone.pdf", "m", &VersionToken::new("sha1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
