//! Local ledger of accepted uploads (SQLite via sqlx).
//!
//! One row per successful upload: record, field, receipt, reference
//! checksum, size, and locator. Wrapping keys are never stored here.

mod db;
mod types;

#[cfg(test)]
mod tests;

pub use db::ReceiptLedger;
pub use types::{NewReceipt, ReceiptEntry, ReceiptId};
