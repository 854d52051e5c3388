//! Asset transfer engine: blocking download and upload state machines.
//!
//! Download: `Unsynced → Downloading → {Downloaded, Failed}`.
//! Upload:   `Unsynced → Uploading → {Uploaded, Failed}`.
//!
//! Both calls block the calling thread for the whole transfer and never retry
//! internally. Callers that want concurrency run them on a worker of their own
//! (e.g. `tokio::task::spawn_blocking`); callers that want retries wrap them
//! with [`crate::retry::run_with_retry`].

mod download;
mod progress;
mod upload;

use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::AssetError;

/// Where downloaded plaintext is materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadTarget {
    #[default]
    Memory,
    /// Written as `<dir>/<checksum>.bin` through a uniquely named `.part` file and rename.
    Directory(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    pub target: DownloadTarget,
    pub cancel: Option<CancelToken>,
}

#[derive(Debug, Clone, Default)]
pub struct TransferEngine {
    options: TransferOptions,
}

impl TransferEngine {
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    pub fn with_target(mut self, target: DownloadTarget) -> Self {
        self.options.target = target;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.options.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    fn check_cancelled(&self) -> Result<(), AssetError> {
        match &self.options.cancel {
            Some(token) if token.is_cancelled() => Err(AssetError::Cancelled),
            _ => Ok(()),
        }
    }
}
