//! Shared-token credential storage.
//!
//! The gateway authenticates every request against a single shared secret
//! kept in a plain file. The provider re-reads the file on every call, so
//! rotating the credential is an out-of-band file edit with no restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("cannot read token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the shared token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Read the current token. Implementations must not cache.
    async fn read_token(&self) -> Result<String, CredentialError>;
}

/// File-backed provider. The file content is the token, byte for byte: no
/// trimming, so a trailing newline in the file is part of the secret.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Startup check: fail fast on an unreadable token file instead of
    /// surfacing the problem as a 500 on the first request.
    pub async fn verify_readable(&self) -> Result<(), CredentialError> {
        self.read_token().await.map(|_| ())
    }
}

#[async_trait]
impl CredentialProvider for FileCredentials {
    async fn read_token(&self) -> Result<String, CredentialError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CredentialError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Fixed-token provider for tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn read_token(&self) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_credentials_reads_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AUTH_TOKEN");
        std::fs::write(&path, "secret123\n").unwrap();

        let credentials = FileCredentials::new(&path);
        let token = credentials.read_token().await.unwrap();
        assert_eq!(token, "secret123\n", "no trimming: the bytes are the token");
    }

    #[tokio::test]
    async fn test_file_credentials_rereads_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AUTH_TOKEN");
        std::fs::write(&path, "old-token").unwrap();

        let credentials = FileCredentials::new(&path);
        assert_eq!(credentials.read_token().await.unwrap(), "old-token");

        std::fs::write(&path, "new-token").unwrap();
        assert_eq!(
            credentials.read_token().await.unwrap(),
            "new-token",
            "rotation must take effect without a restart"
        );
    }

    #[tokio::test]
    async fn test_file_credentials_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent");

        let credentials = FileCredentials::new(&path);
        let err = credentials.read_token().await.unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_verify_readable_matches_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AUTH_TOKEN");

        let credentials = FileCredentials::new(&path);
        assert!(credentials.verify_readable().await.is_err());

        std::fs::write(&path, "tok").unwrap();
        assert!(credentials.verify_readable().await.is_ok());
    }

    #[tokio::test]
    async fn test_static_credentials_returns_fixed_token() {
        let credentials = StaticCredentials::new("fixed");
        assert_eq!(credentials.read_token().await.unwrap(), "fixed");
        assert_eq!(credentials.read_token().await.unwrap(), "fixed");
    }
}
