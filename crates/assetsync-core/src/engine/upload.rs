//! Upload track: checksum, encrypt, hand ciphertext to the database, record receipt.

use super::TransferEngine;
use crate::asset::{Asset, Receipt};
use crate::channel::{TransferChannel, UploadAck};
use crate::checksum;
use crate::crypto::{self, WrappingKey};
use crate::error::AssetError;
use crate::record::{FieldValue, Record};

impl TransferEngine {
    /// Encrypt and upload the asset's local content, then point
    /// `record[field_name]` at it.
    ///
    /// Any previous receipt is cleared first, so after an error the asset
    /// has no receipt. File checksum and size may already be updated on
    /// failure and do not indicate success. On success the engine's checksum
    /// becomes the reference checksum.
    pub fn upload_into_record<'a, C>(
        &self,
        asset: &'a mut Asset,
        record: &mut Record,
        field_name: &str,
        database: &C,
    ) -> Result<&'a Receipt, AssetError>
    where
        C: TransferChannel + ?Sized,
    {
        asset.receipt = None;

        match self.seal_and_send(asset, record, field_name, database) {
            Ok(ack) => {
                asset.upload_failure = None;
                asset.reference_checksum = asset.file_checksum.clone();
                if let Some(locator) = ack.remote_locator {
                    asset.remote_locator = Some(locator);
                }

                let mut meta = asset.metadata();
                meta.receipt = Some(ack.receipt.clone());
                record.set(field_name, FieldValue::Asset(meta));

                tracing::info!(
                    record = record.record_name(),
                    field = field_name,
                    receipt = %ack.receipt,
                    "asset uploaded"
                );
                Ok(asset.receipt.insert(ack.receipt))
            }
            Err(e) => {
                tracing::warn!(
                    "asset upload into {}.{} failed: {}",
                    record.record_name(),
                    field_name,
                    e
                );
                asset.upload_failure = Some(e.kind());
                Err(e)
            }
        }
    }

    fn seal_and_send<C>(
        &self,
        asset: &mut Asset,
        record: &Record,
        field_name: &str,
        database: &C,
    ) -> Result<UploadAck, AssetError>
    where
        C: TransferChannel + ?Sized,
    {
        self.check_cancelled()?;
        let content = asset
            .upload_content()
            .ok_or(AssetError::MissingPrecondition("local content"))?;
        let plaintext = content.read().map_err(AssetError::local)?.into_owned();
        let key = asset
            .wrapping_key
            .get_or_insert_with(WrappingKey::generate)
            .clone();

        let file_checksum = checksum::compute(&plaintext);
        let size = plaintext.len() as u64;
        let ciphertext = crypto::encrypt(&plaintext, &key)?;
        drop(plaintext);

        tracing::debug!(
            size,
            ciphertext_len = ciphertext.len(),
            checksum = %file_checksum,
            "asset sealed for upload"
        );
        asset.file_checksum = Some(file_checksum);
        asset.file_size = Some(size);

        self.check_cancelled()?;
        database
            .upload(record, field_name, &ciphertext)
            .map_err(AssetError::from_upload)
    }
}
