//! Asset metadata model: checksums, size, wrapping key, receipt, and the
//! terminal outcome of the last download.
//!
//! An `Asset` is mutated in place by the transfer engine. Transfers take
//! `&mut self`, so at most one can be in flight per instance; distinct assets
//! share nothing and may transfer in parallel.

mod content;
mod metadata;

pub use content::{DownloadOutcome, LocalContent};
pub use metadata::{AssetMetadata, Receipt, RemoteLocator};

use std::path::PathBuf;

use crate::channel::TransferChannel;
use crate::checksum::Checksum;
use crate::crypto::WrappingKey;
use crate::engine::TransferEngine;
use crate::error::{AssetError, AssetErrorKind};
use crate::record::Record;

/// Download track state, derived from the stored outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Unsynced,
    Downloaded,
    Failed,
}

/// Upload track state. Only a receipt means `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Unsynced,
    Uploaded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct Asset {
    /// Caller-supplied plaintext for a fresh upload.
    pub(crate) source: Option<LocalContent>,
    pub(crate) download: Option<DownloadOutcome>,
    pub(crate) upload_failure: Option<AssetErrorKind>,
    pub(crate) file_checksum: Option<Checksum>,
    pub(crate) reference_checksum: Option<Checksum>,
    pub(crate) file_size: Option<u64>,
    pub(crate) wrapping_key: Option<WrappingKey>,
    pub(crate) receipt: Option<Receipt>,
    pub(crate) remote_locator: Option<RemoteLocator>,
}

impl Asset {
    /// New asset for upload, backed by a file on disk.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(LocalContent::File(path.into())),
            ..Self::default()
        }
    }

    /// New asset for upload, backed by in-memory bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: Some(LocalContent::Memory(bytes.into())),
            ..Self::default()
        }
    }

    /// Asset described by server metadata (typically from a fetched record).
    pub fn from_metadata(meta: AssetMetadata) -> Self {
        let mut asset = Self::default();
        asset.update_with_metadata(meta);
        asset
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        AssetMetadata::from_json(json).map(Self::from_metadata)
    }

    /// Overlay a later server snapshot. Keys absent from `meta` leave the
    /// current value untouched; in particular an existing receipt survives a
    /// snapshot that does not carry one.
    pub fn update_with_metadata(&mut self, meta: AssetMetadata) {
        let AssetMetadata {
            reference_checksum,
            file_size,
            wrapping_key,
            receipt,
            remote_locator,
        } = meta;
        if let Some(v) = reference_checksum {
            self.reference_checksum = Some(v);
        }
        if let Some(v) = file_size {
            self.file_size = Some(v);
        }
        if let Some(v) = wrapping_key {
            self.wrapping_key = Some(v);
        }
        if let Some(v) = receipt {
            self.receipt = Some(v);
        }
        if let Some(v) = remote_locator {
            self.remote_locator = Some(v);
        }
    }

    pub fn update_with_json(&mut self, json: &str) -> serde_json::Result<()> {
        self.update_with_metadata(AssetMetadata::from_json(json)?);
        Ok(())
    }

    /// Snapshot stored into a record field and sent to the server.
    pub fn metadata(&self) -> AssetMetadata {
        AssetMetadata {
            reference_checksum: self.reference_checksum.clone(),
            file_size: self.file_size,
            wrapping_key: self.wrapping_key.clone(),
            receipt: self.receipt.clone(),
            remote_locator: self.remote_locator.clone(),
        }
    }

    /// Download with default engine options (content kept in memory).
    pub fn download_synchronously<C, P>(&mut self, channel: &C, progress: P) -> &DownloadOutcome
    where
        C: TransferChannel + ?Sized,
        P: FnMut(f64),
    {
        TransferEngine::default().download(self, channel, progress)
    }

    /// Upload with default engine options and attach the asset to `record[field_name]`.
    pub fn upload_synchronously_into_record<C>(
        &mut self,
        record: &mut Record,
        field_name: &str,
        database: &C,
    ) -> Result<&Receipt, AssetError>
    where
        C: TransferChannel + ?Sized,
    {
        TransferEngine::default().upload_into_record(self, record, field_name, database)
    }

    /// Plaintext handle: the downloaded content after a successful download,
    /// none after a failed one, otherwise the caller-supplied source.
    pub fn local_content(&self) -> Option<&LocalContent> {
        match &self.download {
            Some(outcome) => outcome.content(),
            None => self.source.as_ref(),
        }
    }

    /// Plaintext to seal on upload: verified downloaded content if present,
    /// else the caller-supplied source. A failed download does not hide the source.
    pub(crate) fn upload_content(&self) -> Option<&LocalContent> {
        self.download
            .as_ref()
            .and_then(DownloadOutcome::content)
            .or(self.source.as_ref())
    }

    pub fn download_error(&self) -> Option<&AssetError> {
        self.download.as_ref().and_then(DownloadOutcome::error)
    }

    pub fn download_outcome(&self) -> Option<&DownloadOutcome> {
        self.download.as_ref()
    }

    pub fn download_state(&self) -> DownloadState {
        match &self.download {
            None => DownloadState::Unsynced,
            Some(DownloadOutcome::Downloaded(_)) => DownloadState::Downloaded,
            Some(DownloadOutcome::Failed(_)) => DownloadState::Failed,
        }
    }

    pub fn upload_state(&self) -> UploadState {
        if self.receipt.is_some() {
            UploadState::Uploaded
        } else if self.upload_failure.is_some() {
            UploadState::Failed
        } else {
            UploadState::Unsynced
        }
    }

    /// Kind of the last upload failure, cleared by a successful upload.
    pub fn upload_failure(&self) -> Option<AssetErrorKind> {
        self.upload_failure
    }

    pub fn file_checksum(&self) -> Option<&Checksum> {
        self.file_checksum.as_ref()
    }

    pub fn reference_checksum(&self) -> Option<&Checksum> {
        self.reference_checksum.as_ref()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn wrapping_key(&self) -> Option<&WrappingKey> {
        self.wrapping_key.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn remote_locator(&self) -> Option<&RemoteLocator> {
        self.remote_locator.as_ref()
    }
}
