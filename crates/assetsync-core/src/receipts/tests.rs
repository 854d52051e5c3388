use super::{NewReceipt, ReceiptLedger};
use crate::asset::{Asset, Receipt, RemoteLocator};
use crate::channel::MemoryChannel;
use crate::checksum;
use crate::record::Record;

fn sample(receipt: &str) -> NewReceipt {
    NewReceipt {
        record_type: "Photo".into(),
        record_name: "beach".into(),
        field: "image".into(),
        receipt: Receipt::new(receipt),
        reference_checksum: checksum::compute(b"sand"),
        size: 4,
        locator: Some(RemoteLocator::new("memory://beach/image/1")),
    }
}

#[tokio::test]
async fn empty_ledger_lists_nothing() {
    let ledger = ReceiptLedger::open_memory().await.unwrap();
    assert!(ledger.list_receipts().await.unwrap().is_empty());
    assert!(ledger
        .find_by_receipt(&Receipt::new("missing"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn record_and_list_in_insertion_order() {
    let ledger = ReceiptLedger::open_memory().await.unwrap();
    let a = ledger.record_upload(&sample("r-a")).await.unwrap();
    let b = ledger.record_upload(&sample("r-b")).await.unwrap();
    assert!(b > a);

    let entries = ledger.list_receipts().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, a);
    assert_eq!(entries[0].receipt.as_str(), "r-a");
    assert_eq!(entries[1].receipt.as_str(), "r-b");
    assert_eq!(entries[0].record_type, "Photo");
    assert_eq!(entries[0].field, "image");
    assert_eq!(entries[0].size, 4);
    assert_eq!(entries[0].reference_checksum, checksum::compute(b"sand"));
    assert!(entries[0].created_at > 0);
}

#[tokio::test]
async fn find_by_receipt_returns_latest() {
    let ledger = ReceiptLedger::open_memory().await.unwrap();
    ledger.record_upload(&sample("dup")).await.unwrap();
    let mut second = sample("dup");
    second.size = 99;
    second.locator = None;
    let id = ledger.record_upload(&second).await.unwrap();

    let found = ledger
        .find_by_receipt(&Receipt::new("dup"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.size, 99);
    assert!(found.locator.is_none());
}

#[tokio::test]
async fn open_at_persists_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested dir").join("receipts.db");
    {
        let ledger = ReceiptLedger::open_at(&path).await.unwrap();
        ledger.record_upload(&sample("kept")).await.unwrap();
    }
    let reopened = ReceiptLedger::open_at(&path).await.unwrap();
    let entries = reopened.list_receipts().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].receipt.as_str(), "kept");
}

#[test]
fn snapshot_requires_a_successful_upload() {
    let mut asset = Asset::from_bytes(b"0123456789".to_vec());
    assert!(NewReceipt::from_uploaded("Doc", "d1", "body", &asset).is_none());

    let channel = MemoryChannel::new();
    let mut record = Record::new("Doc", "d1");
    asset
        .upload_synchronously_into_record(&mut record, "body", &channel)
        .unwrap();

    let entry = NewReceipt::from_uploaded("Doc", "d1", "body", &asset).unwrap();
    assert_eq!(Some(&entry.receipt), asset.receipt());
    assert_eq!(entry.reference_checksum, checksum::compute(b"0123456789"));
    assert_eq!(entry.size, 10);
    assert!(entry.locator.is_some());
}
