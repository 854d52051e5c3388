//! In-process channel: ciphertext held in a map keyed by locator.
//!
//! Useful for tests and for embedding the engine without a server. Supports a
//! byte quota so upload rejection can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{chunked, validate_path_component, ChannelError, ChunkStream, TransferChannel, UploadAck};
use crate::asset::{Receipt, RemoteLocator};
use crate::record::Record;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct MemoryChannel {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    chunk_size: usize,
    quota_bytes: Option<u64>,
    next_id: AtomicU64,
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            quota_bytes: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Size of chunks yielded by downloads.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Reject uploads once the total stored ciphertext would exceed `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Store `ciphertext` at `locator` directly, replacing anything there.
    pub fn insert(&self, locator: &RemoteLocator, ciphertext: Vec<u8>) {
        self.lock().insert(locator.as_str().to_string(), ciphertext);
    }

    /// Copy of the ciphertext stored at `locator`.
    pub fn get(&self, locator: &RemoteLocator) -> Option<Vec<u8>> {
        self.lock().get(locator.as_str()).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TransferChannel for MemoryChannel {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError> {
        let data = self
            .get(locator)
            .ok_or_else(|| ChannelError::NotFound(locator.to_string()))?;
        let len = data.len() as u64;
        Ok(ChunkStream::new(Some(len), chunked(data, self.chunk_size)))
    }

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError> {
        validate_path_component("record", record.record_name())?;
        validate_path_component("field", field_name)?;

        let mut blobs = self.lock();
        if let Some(quota) = self.quota_bytes {
            let used: u64 = blobs.values().map(|b| b.len() as u64).sum();
            if used + ciphertext.len() as u64 > quota {
                return Err(ChannelError::Rejected(format!(
                    "quota exceeded: {} + {} > {} bytes",
                    used,
                    ciphertext.len(),
                    quota
                )));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let locator = RemoteLocator::new(format!(
            "memory://{}/{}/{}",
            record.record_name(),
            field_name,
            id
        ));
        blobs.insert(locator.as_str().to_string(), ciphertext.to_vec());
        tracing::debug!("memory channel stored {} bytes at {}", ciphertext.len(), locator);

        Ok(UploadAck {
            receipt: Receipt::new(format!("mem-{id}")),
            remote_locator: Some(locator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_then_download_yields_same_bytes_in_chunks() {
        let ch = MemoryChannel::new().with_chunk_size(3);
        let record = Record::new("Photo", "p1");
        let ack = ch.upload(&record, "image", b"0123456789").unwrap();
        assert_eq!(ack.receipt.as_str(), "mem-1");
        let locator = ack.remote_locator.unwrap();

        let stream = ch.download(&locator).unwrap();
        assert_eq!(stream.expected_len(), Some(10));
        let chunks: Vec<Vec<u8>> = stream.map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.concat(), b"0123456789");
    }

    #[test]
    fn quota_rejects_oversized_upload() {
        let ch = MemoryChannel::new().with_quota(8);
        let record = Record::new("Photo", "p1");
        ch.upload(&record, "a", b"12345").unwrap();
        let err = ch.upload(&record, "b", b"12345").unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(ch.len(), 1);
    }

    #[test]
    fn missing_locator_is_not_found() {
        let ch = MemoryChannel::new();
        let err = ch
            .download(&RemoteLocator::new("memory://nope/x/1"))
            .err()
            .unwrap();
        assert!(matches!(err, ChannelError::NotFound(_)));
    }
}
