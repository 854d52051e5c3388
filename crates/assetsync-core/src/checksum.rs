//! Content checksums (SHA-256, lowercase hex) over plaintext asset bytes.
//!
//! The digest depends only on the bytes, never on how they were chunked:
//! feeding a [`ChecksumHasher`] piecewise yields the same value as [`compute`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// A content digest as carried in asset metadata.
///
/// Server-declared values are kept verbatim; comparison is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental SHA-256 over a sequence of plaintext chunks.
#[derive(Default, Clone)]
pub struct ChecksumHasher {
    hasher: Sha256,
    len: u64,
}

impl ChecksumHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finalize(self) -> Checksum {
        Checksum(hex::encode(self.hasher.finalize()))
    }
}

/// Compute the checksum of `bytes`.
pub fn compute(bytes: &[u8]) -> Checksum {
    let mut hasher = ChecksumHasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Exact comparison of a computed digest against the reference digest.
pub fn verify(digest: &Checksum, reference: &Checksum) -> bool {
    digest == reference
}

/// Compute SHA-256 of a file and return the digest.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<Checksum> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = ChecksumHasher::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
