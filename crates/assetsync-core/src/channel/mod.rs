//! Transfer channel boundary: moves opaque ciphertext to and from the remote store.
//!
//! The engine only ever sees ciphertext here. Framing, addressing, and
//! authentication with the server are the channel's concern.

mod directory;
mod error;
mod http;
mod memory;

pub use directory::DirectoryChannel;
pub use error::ChannelError;
pub use http::{HttpChannel, HttpOptions};
pub use memory::MemoryChannel;

use anyhow::{Context, Result};

use crate::asset::{Receipt, RemoteLocator};
use crate::config::{AssetSyncConfig, ChannelBackend};
use crate::record::Record;

/// One item of a download stream.
pub type ChunkResult = Result<Vec<u8>, ChannelError>;

/// Finite, lazily produced sequence of ciphertext chunks. Not restartable:
/// calling [`TransferChannel::download`] again starts a new stream from byte 0.
pub struct ChunkStream<'a> {
    expected_len: Option<u64>,
    chunks: Box<dyn Iterator<Item = ChunkResult> + 'a>,
}

impl<'a> ChunkStream<'a> {
    pub fn new<I>(expected_len: Option<u64>, chunks: I) -> Self
    where
        I: Iterator<Item = ChunkResult> + 'a,
    {
        Self {
            expected_len,
            chunks: Box::new(chunks),
        }
    }

    /// Total ciphertext length the remote side declared, if any.
    pub fn expected_len(&self) -> Option<u64> {
        self.expected_len
    }
}

impl Iterator for ChunkStream<'_> {
    type Item = ChunkResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }
}

/// Server acknowledgement of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    pub receipt: Receipt,
    /// Where the stored ciphertext can be fetched from, when the server says.
    pub remote_locator: Option<RemoteLocator>,
}

/// Streamed download / whole-payload upload against the remote database.
pub trait TransferChannel {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError>;

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError>;
}

impl<T: TransferChannel + ?Sized> TransferChannel for &T {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError> {
        (**self).download(locator)
    }

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError> {
        (**self).upload(record, field_name, ciphertext)
    }
}

impl<T: TransferChannel + ?Sized> TransferChannel for Box<T> {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError> {
        (**self).download(locator)
    }

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError> {
        (**self).upload(record, field_name, ciphertext)
    }
}

/// Build the channel selected in config.
pub fn from_config(cfg: &AssetSyncConfig) -> Result<Box<dyn TransferChannel + Send + Sync>> {
    match cfg.channel {
        ChannelBackend::Directory => {
            let root = cfg.resolved_store_dir()?;
            tracing::debug!("using directory channel at {}", root.display());
            Ok(Box::new(
                DirectoryChannel::open(&root)?.with_chunk_size(cfg.chunk_size),
            ))
        }
        ChannelBackend::Http => {
            let endpoint = cfg
                .endpoint
                .as_deref()
                .context("config: `endpoint` is required for the http channel")?;
            tracing::debug!("using http channel at {}", endpoint);
            let channel = HttpChannel::new(endpoint, HttpOptions::from_config(cfg))?;
            Ok(Box::new(channel))
        }
    }
}

/// Split `data` into owned chunks of at most `chunk_size` bytes.
pub(crate) fn chunked(data: Vec<u8>, chunk_size: usize) -> impl Iterator<Item = ChunkResult> {
    let chunk_size = chunk_size.max(1);
    let mut offset = 0usize;
    std::iter::from_fn(move || {
        if offset >= data.len() {
            return None;
        }
        let end = (offset + chunk_size).min(data.len());
        let chunk = data[offset..end].to_vec();
        offset = end;
        Some(Ok(chunk))
    })
}

/// Reject names that could escape a store directory or form an ambiguous path.
pub(crate) fn validate_path_component(kind: &str, name: &str) -> Result<(), ChannelError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.len() > 255
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());
    if bad {
        return Err(ChannelError::Rejected(format!("invalid {kind} name: {name:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_splits_and_preserves_bytes() {
        let data: Vec<u8> = (0u8..10).collect();
        let chunks: Vec<Vec<u8>> = chunked(data.clone(), 4).map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], vec![8, 9]);
        assert_eq!(chunks.concat(), data);
        assert_eq!(chunked(Vec::new(), 4).count(), 0);
    }

    #[test]
    fn path_components_are_validated() {
        assert!(validate_path_component("record", "photo-1").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(
                    validate_path_component("record", bad),
                    Err(ChannelError::Rejected(_))
                ),
                "{bad:?}"
            );
        }
    }
}
