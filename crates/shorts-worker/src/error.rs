//! Publisher error types.

use shorts_google::GoogleError;
use shorts_media::MediaError;
use thiserror::Error;

pub type PublisherResult<T> = Result<T, PublisherError>;

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Missing credential: {0}")]
    CredentialMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(GoogleError),

    #[error("Upload failed: {0}")]
    Upload(GoogleError),

    #[error("Post-publish action failed: {0}")]
    PostAction(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublisherError {
    pub fn credential_missing(name: impl Into<String>) -> Self {
        Self::CredentialMissing(name.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn audit(msg: impl Into<String>) -> Self {
        Self::Audit(msg.into())
    }

    pub fn post_action(msg: impl Into<String>) -> Self {
        Self::PostAction(msg.into())
    }

    /// Only a missing credential halts the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PublisherError::CredentialMissing(_))
    }

    /// Check if error is worth retrying within the same run.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublisherError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_credentials_are_fatal() {
        assert!(PublisherError::credential_missing("TOKEN_JSON").is_fatal());
        assert!(!PublisherError::config("bad time").is_fatal());
        assert!(!PublisherError::Upload(GoogleError::from_http_status(500, "x")).is_fatal());
        assert!(!PublisherError::ledger("disk full").is_fatal());
    }

    #[test]
    fn test_storage_retryability_follows_google_error() {
        assert!(PublisherError::Storage(GoogleError::from_http_status(503, "x")).is_retryable());
        assert!(!PublisherError::Storage(GoogleError::from_http_status(404, "x")).is_retryable());
        assert!(!PublisherError::Upload(GoogleError::from_http_status(503, "x")).is_retryable());
    }
}
