//! Download track: stream ciphertext, decrypt, verify, materialize.

use super::progress::ProgressTracker;
use super::{DownloadTarget, TransferEngine};
use crate::asset::{Asset, DownloadOutcome, LocalContent};
use crate::channel::{ChannelError, TransferChannel};
use crate::checksum::{self, Checksum};
use crate::crypto::{self, CIPHERTEXT_OVERHEAD};
use crate::error::AssetError;
use crate::storage;

/// Cap on up-front buffer reservation from a server-declared length.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Plaintext that passed decryption and checksum verification.
struct Verified {
    content: LocalContent,
    checksum: Checksum,
    size: u64,
}

impl TransferEngine {
    /// Download, decrypt, and verify `asset`, blocking until done.
    ///
    /// Requires a remote locator, a wrapping key, and a reference checksum.
    /// The returned outcome is also stored on the asset; it holds either the
    /// local content or the error, never both. `progress` sees a
    /// non-decreasing fraction after each chunk and exactly `1.0` before a
    /// successful outcome is stored. Calling again re-runs the full transfer.
    pub fn download<'a, C, P>(
        &self,
        asset: &'a mut Asset,
        channel: &C,
        mut progress: P,
    ) -> &'a DownloadOutcome
    where
        C: TransferChannel + ?Sized,
        P: FnMut(f64),
    {
        let outcome = match self.fetch_and_verify(asset, channel, &mut progress) {
            Ok(verified) => {
                tracing::info!(
                    size = verified.size,
                    checksum = %verified.checksum,
                    "asset downloaded"
                );
                asset.file_checksum = Some(verified.checksum);
                asset.file_size = Some(verified.size);
                DownloadOutcome::Downloaded(verified.content)
            }
            Err(e) => {
                tracing::warn!("asset download failed: {}", e);
                // No verified content, so no checksum of it. file_size stays
                // as the declared size.
                asset.file_checksum = None;
                DownloadOutcome::Failed(e)
            }
        };
        asset.download.insert(outcome)
    }

    fn fetch_and_verify<C>(
        &self,
        asset: &Asset,
        channel: &C,
        progress: &mut dyn FnMut(f64),
    ) -> Result<Verified, AssetError>
    where
        C: TransferChannel + ?Sized,
    {
        let locator = asset
            .remote_locator
            .as_ref()
            .ok_or(AssetError::MissingPrecondition("remote locator"))?;
        let key = asset
            .wrapping_key
            .as_ref()
            .ok_or(AssetError::MissingPrecondition("wrapping key"))?;
        let reference = asset
            .reference_checksum
            .as_ref()
            .ok_or(AssetError::MissingPrecondition("reference checksum"))?;

        self.check_cancelled()?;
        tracing::debug!("downloading asset from {}", locator);
        let stream = channel
            .download(locator)
            .map_err(AssetError::NetworkTransfer)?;

        let declared = stream.expected_len();
        let estimate = declared.or(asset.file_size.map(|s| s + CIPHERTEXT_OVERHEAD));
        let mut tracker = ProgressTracker::new(estimate, progress);
        let mut ciphertext = Vec::with_capacity(estimate.unwrap_or(0).min(MAX_PREALLOC) as usize);

        for chunk in stream {
            self.check_cancelled()?;
            let chunk = chunk.map_err(AssetError::NetworkTransfer)?;
            ciphertext.extend_from_slice(&chunk);
            tracker.advance(chunk.len() as u64);
        }

        let received = ciphertext.len() as u64;
        if let Some(expected) = declared {
            if received < expected {
                return Err(AssetError::NetworkTransfer(ChannelError::Truncated {
                    expected,
                    received,
                }));
            }
            if received > expected {
                return Err(AssetError::NetworkTransfer(ChannelError::Overrun {
                    expected,
                    received,
                }));
            }
        }

        let plaintext = crypto::decrypt(&ciphertext, key)?;
        drop(ciphertext);

        let actual = checksum::compute(&plaintext);
        if !checksum::verify(&actual, reference) {
            return Err(AssetError::ChecksumMismatch {
                expected: reference.clone(),
                actual,
            });
        }

        let size = plaintext.len() as u64;
        if let Some(declared_size) = asset.file_size {
            if declared_size != size {
                tracing::debug!(
                    declared_size,
                    size,
                    "declared size differs from verified content"
                );
            }
        }

        let content = self.materialize(plaintext, &actual)?;
        tracker.finish();
        Ok(Verified {
            content,
            checksum: actual,
            size,
        })
    }

    fn materialize(&self, plaintext: Vec<u8>, checksum: &Checksum) -> Result<LocalContent, AssetError> {
        match &self.options.target {
            DownloadTarget::Memory => Ok(LocalContent::Memory(plaintext)),
            DownloadTarget::Directory(dir) => {
                let path = dir.join(format!("{}.bin", checksum));
                storage::write_atomically(&path, &plaintext).map_err(AssetError::local)?;
                Ok(LocalContent::File(path))
            }
        }
    }
}
