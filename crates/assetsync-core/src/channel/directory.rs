//! Directory-backed channel: ciphertext blobs stored as files under a root.
//!
//! Layout: `<root>/<record_name>/<field_name>/<receipt>.blob`. The locator is
//! the relative `<record_name>/<field_name>/<receipt>` path. Uploads are
//! written through a `.part` file and renamed, so a crashed upload never
//! leaves a readable blob.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::{validate_path_component, ChannelError, ChunkStream, TransferChannel, UploadAck};
use crate::asset::{Receipt, RemoteLocator};
use crate::checksum;
use crate::record::Record;
use crate::storage;

const BLOB_EXT: &str = "blob";

#[derive(Debug, Clone)]
pub struct DirectoryChannel {
    root: PathBuf,
    chunk_size: usize,
}

impl DirectoryChannel {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            chunk_size: super::memory::DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a locator onto a blob path inside the root, refusing anything else.
    fn blob_path(&self, locator: &RemoteLocator) -> Result<PathBuf, ChannelError> {
        let parts: Vec<&str> = locator.as_str().split('/').collect();
        let [record, field, receipt] = parts.as_slice() else {
            return Err(ChannelError::Protocol(format!(
                "bad directory locator: {locator}"
            )));
        };
        for (kind, part) in [("record", record), ("field", field), ("receipt", receipt)] {
            validate_path_component(kind, part)
                .map_err(|_| ChannelError::Protocol(format!("bad directory locator: {locator}")))?;
        }
        Ok(self
            .root
            .join(record)
            .join(field)
            .join(format!("{receipt}.{BLOB_EXT}")))
    }
}

impl TransferChannel for DirectoryChannel {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError> {
        let path = self.blob_path(locator)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ChannelError::NotFound(locator.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata()?.len();
        Ok(ChunkStream::new(Some(len), FileChunks::new(file, self.chunk_size)))
    }

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError> {
        validate_path_component("record", record.record_name())?;
        validate_path_component("field", field_name)?;

        // Nonces make every ciphertext unique, so its digest is a stable receipt.
        let receipt = Receipt::new(checksum::compute(ciphertext).as_str());
        let locator = RemoteLocator::new(format!(
            "{}/{}/{}",
            record.record_name(),
            field_name,
            receipt
        ));
        let path = self.blob_path(&locator)?;
        storage::write_atomically(&path, ciphertext)?;
        tracing::debug!("stored {} bytes at {}", ciphertext.len(), path.display());

        Ok(UploadAck {
            receipt,
            remote_locator: Some(locator),
        })
    }
}

/// Lazy fixed-size reads from an open file.
struct FileChunks {
    file: Option<File>,
    chunk_size: usize,
}

impl FileChunks {
    fn new(file: File, chunk_size: usize) -> Self {
        Self {
            file: Some(file),
            chunk_size,
        }
    }
}

impl Iterator for FileChunks {
    type Item = super::ChunkResult;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.file.as_mut()?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.file = None;
                    return Some(Err(e.into()));
                }
            }
        }
        if filled == 0 {
            self.file = None;
            return None;
        }
        buf.truncate(filled);
        Some(Ok(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_writes_blob_and_download_streams_it() {
        let dir = tempfile::tempdir().unwrap();
        let ch = DirectoryChannel::open(dir.path()).unwrap().with_chunk_size(4);
        let record = Record::new("Doc", "d1");
        let ack = ch.upload(&record, "body", b"0123456789").unwrap();
        let locator = ack.remote_locator.unwrap();
        assert!(locator.as_str().starts_with("d1/body/"));

        let stream = ch.download(&locator).unwrap();
        assert_eq!(stream.expected_len(), Some(10));
        let chunks: Vec<Vec<u8>> = stream.map(|c| c.unwrap()).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), b"0123456789");
    }

    #[test]
    fn rejects_traversal_names_and_locators() {
        let dir = tempfile::tempdir().unwrap();
        let ch = DirectoryChannel::open(dir.path()).unwrap();
        let record = Record::new("Doc", "..");
        assert!(ch.upload(&record, "body", b"x").unwrap_err().is_rejection());
        for bad in ["../etc/passwd", "a/b", "a/../c", "a/b/c/d"] {
            let err = ch.download(&RemoteLocator::new(bad)).err().unwrap();
            assert!(matches!(err, ChannelError::Protocol(_)), "{bad}");
        }
    }

    #[test]
    fn missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ch = DirectoryChannel::open(dir.path()).unwrap();
        let err = ch.download(&RemoteLocator::new("d1/body/abc")).err().unwrap();
        assert!(matches!(err, ChannelError::NotFound(_)));
    }
}
