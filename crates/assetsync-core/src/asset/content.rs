//! Local plaintext handles and the terminal result of a download.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Decrypted content available locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalContent {
    Memory(Vec<u8>),
    File(PathBuf),
}

impl LocalContent {
    /// Read the full plaintext. Borrows for in-memory content.
    pub fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        match self {
            LocalContent::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            LocalContent::File(path) => std::fs::read(path).map(Cow::Owned),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            LocalContent::File(path) => Some(path),
            LocalContent::Memory(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LocalContent::Memory(bytes) => Some(bytes),
            LocalContent::File(_) => None,
        }
    }
}

/// Outcome of the most recent completed download: content or error, never both.
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    Downloaded(LocalContent),
    Failed(AssetError),
}

impl DownloadOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, DownloadOutcome::Downloaded(_))
    }

    pub fn content(&self) -> Option<&LocalContent> {
        match self {
            DownloadOutcome::Downloaded(c) => Some(c),
            DownloadOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AssetError> {
        match self {
            DownloadOutcome::Downloaded(_) => None,
            DownloadOutcome::Failed(e) => Some(e),
        }
    }

    pub fn as_result(&self) -> Result<&LocalContent, &AssetError> {
        match self {
            DownloadOutcome::Downloaded(c) => Ok(c),
            DownloadOutcome::Failed(e) => Err(e),
        }
    }
}

impl From<Result<LocalContent, AssetError>> for DownloadOutcome {
    fn from(r: Result<LocalContent, AssetError>) -> Self {
        match r {
            Ok(c) => DownloadOutcome::Downloaded(c),
            Err(e) => DownloadOutcome::Failed(e),
        }
    }
}
