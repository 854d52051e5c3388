//! `assetsync receipts` – list accepted uploads from the ledger.

use anyhow::Result;
use assetsync_core::receipts::ReceiptLedger;

pub async fn run_receipts(ledger: &ReceiptLedger) -> Result<()> {
    let entries = ledger.list_receipts().await?;
    if entries.is_empty() {
        println!("No uploads recorded.");
        return Ok(());
    }
    println!(
        "{:<6} {:<16} {:<24} {:<10} {}",
        "ID", "RECEIPT", "RECORD.FIELD", "SIZE", "CHECKSUM"
    );
    for e in entries {
        println!(
            "{:<6} {:<16} {:<24} {:<10} {}",
            e.id,
            e.receipt.as_str(),
            format!("{}.{}", e.record_name, e.field),
            e.size,
            e.reference_checksum
        );
    }
    Ok(())
}
