//! Wrapping-key encryption of asset content (AES-256-GCM).
//!
//! Ciphertext layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! A fresh random nonce is drawn for every call to [`encrypt`], so encrypting
//! the same plaintext twice under one key yields different bytes.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// Bytes added to the plaintext length by [`encrypt`].
pub const CIPHERTEXT_OVERHEAD: u64 = (NONCE_SIZE + TAG_SIZE) as u64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("wrapping key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("wrapping key is not valid base64: {0}")]
    InvalidKeyEncoding(String),
    #[error("ciphertext too short: {len} bytes")]
    Truncated { len: usize },
    /// Tag check failed: tampered data, wrong key, or corruption.
    #[error("authenticated decryption failed")]
    Authentication,
    #[error("encryption failed")]
    Encrypt,
}

/// Per-asset symmetric key. Travels in metadata as standard base64.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WrappingKey([u8; KEY_SIZE]);

impl WrappingKey {
    /// Fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rng().fill(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKeyEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for WrappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WrappingKey([redacted])")
    }
}

impl TryFrom<String> for WrappingKey {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

impl From<WrappingKey> for String {
    fn from(key: WrappingKey) -> Self {
        key.to_base64()
    }
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(plaintext: &[u8], key: &WrappingKey) -> Result<Vec<u8>, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let sealed = key
        .cipher()
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt and authenticate `ciphertext` produced by [`encrypt`].
pub fn decrypt(ciphertext: &[u8], key: &WrappingKey) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Truncated {
            len: ciphertext.len(),
        });
    }
    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_SIZE);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| CryptoError::Authentication)
}
