//! Error kinds surfaced by the transfer engine.

use std::sync::Arc;
use thiserror::Error;

use crate::channel::ChannelError;
use crate::checksum::Checksum;
use crate::crypto::CryptoError;

/// Terminal failure of one download or upload call. Never retried internally.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// The channel failed to deliver a complete byte stream.
    #[error("network transfer failed: {0}")]
    NetworkTransfer(#[source] ChannelError),

    /// Ciphertext failed authenticated decryption under the wrapping key.
    #[error("decryption failed: {0}")]
    Decryption(#[from] CryptoError),

    /// Decrypted plaintext does not hash to the reference checksum.
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: Checksum, actual: Checksum },

    /// The database declined the upload; no receipt was produced.
    #[error("upload rejected: {0}")]
    UploadRejected(#[source] ChannelError),

    /// The asset lacks something the operation needs (locator, key, content).
    #[error("asset has no {0}")]
    MissingPrecondition(&'static str),

    /// The caller's cancel token fired before the transfer completed.
    #[error("transfer cancelled")]
    Cancelled,

    /// Reading local plaintext or materializing downloaded content failed.
    #[error("local content: {0}")]
    LocalContent(#[source] Arc<std::io::Error>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetErrorKind {
    NetworkTransfer,
    Decryption,
    ChecksumMismatch,
    UploadRejected,
    MissingPrecondition,
    Cancelled,
    LocalContent,
}

impl AssetError {
    pub fn kind(&self) -> AssetErrorKind {
        match self {
            AssetError::NetworkTransfer(_) => AssetErrorKind::NetworkTransfer,
            AssetError::Decryption(_) => AssetErrorKind::Decryption,
            AssetError::ChecksumMismatch { .. } => AssetErrorKind::ChecksumMismatch,
            AssetError::UploadRejected(_) => AssetErrorKind::UploadRejected,
            AssetError::MissingPrecondition(_) => AssetErrorKind::MissingPrecondition,
            AssetError::Cancelled => AssetErrorKind::Cancelled,
            AssetError::LocalContent(_) => AssetErrorKind::LocalContent,
        }
    }

    pub(crate) fn local(e: std::io::Error) -> Self {
        AssetError::LocalContent(Arc::new(e))
    }

    /// Map a channel failure during upload: explicit refusals become
    /// `UploadRejected`, everything else is a transport failure.
    pub(crate) fn from_upload(e: ChannelError) -> Self {
        if e.is_rejection() {
            AssetError::UploadRejected(e)
        } else {
            AssetError::NetworkTransfer(e)
        }
    }
}
