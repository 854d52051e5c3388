//! Row types for the receipt ledger.

use crate::asset::{Asset, Receipt, RemoteLocator};
use crate::checksum::Checksum;

pub type ReceiptId = i64;

/// What gets written for one accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    pub record_type: String,
    pub record_name: String,
    pub field: String,
    pub receipt: Receipt,
    pub reference_checksum: Checksum,
    pub size: u64,
    pub locator: Option<RemoteLocator>,
}

impl NewReceipt {
    /// Snapshot an uploaded asset. `None` if the asset has no receipt or no
    /// reference checksum, i.e. the last upload did not succeed.
    pub fn from_uploaded(
        record_type: &str,
        record_name: &str,
        field: &str,
        asset: &Asset,
    ) -> Option<Self> {
        Some(Self {
            record_type: record_type.to_string(),
            record_name: record_name.to_string(),
            field: field.to_string(),
            receipt: asset.receipt()?.clone(),
            reference_checksum: asset.reference_checksum()?.clone(),
            size: asset.file_size().unwrap_or(0),
            locator: asset.remote_locator().cloned(),
        })
    }
}

/// A stored ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptEntry {
    pub id: ReceiptId,
    pub record_type: String,
    pub record_name: String,
    pub field: String,
    pub receipt: Receipt,
    pub reference_checksum: Checksum,
    pub size: u64,
    pub locator: Option<RemoteLocator>,
    /// Unix seconds.
    pub created_at: i64,
}
