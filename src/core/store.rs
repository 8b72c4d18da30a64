use crate::error::store::Result;
use async_trait::async_trait;
use std::fmt;

/// Opaque version of a remote file (the git blob sha on GitHub). Required by
/// every update and delete so a stale writer fails instead of overwriting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub version: VersionToken,
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Version of the file after the write.
    pub version: VersionToken,
    pub commit: String,
}

/// A remote repository of files addressed by path.
///
/// No method retries. Transport and rate-limit failures come back as
/// `StoreError::RemoteUnavailable`.
#[async_trait]
pub trait TextStore: Send + Sync {
    /// `StoreError::NotFound` if nothing lives at `path`.
    async fn read(&self, path: &str) -> Result<StoredFile>;

    /// With `expected`, a compare-and-swap update (`Conflict` when the file
    /// moved on). Without it, a create (`AlreadyExists` when occupied).
    async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        expected: Option<&VersionToken>,
    ) -> Result<WriteReceipt>;

    /// Returns the commit id. `Conflict` on a stale token, `NotFound` when the
    /// file is already gone.
    async fn delete(&self, path: &str, message: &str, expected: &VersionToken) -> Result<String>;
}
