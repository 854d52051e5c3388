//! Channel (transport/database) failure type.

use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a transfer channel. Carried inside `AssetError` as the
/// collaborator detail.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status that is not a rejection.
    #[error("HTTP {0}")]
    Http(u32),
    /// Stream ended before the declared length (server closed early).
    #[error("stream truncated: expected {expected} bytes, got {received}")]
    Truncated { expected: u64, received: u64 },
    /// Stream delivered more than the declared length.
    #[error("stream overran: expected {expected} bytes, got {received}")]
    Overrun { expected: u64, received: u64 },
    /// Nothing is stored at the locator.
    #[error("not found: {0}")]
    NotFound(String),
    /// The database declined the request (quota, permission, conflict).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Malformed server response or locator.
    #[error("protocol: {0}")]
    Protocol(String),
    #[error("io: {0}")]
    Io(Arc<std::io::Error>),
}

impl ChannelError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, ChannelError::Rejected(_))
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        ChannelError::Io(Arc::new(e))
    }
}
