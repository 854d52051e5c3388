//! `assetsync upload <path> --record <name>` – encrypt, upload, print metadata.

use anyhow::{Context, Result};
use assetsync_core::channel;
use assetsync_core::config::AssetSyncConfig;
use assetsync_core::receipts::{NewReceipt, ReceiptLedger};
use assetsync_core::storage;
use assetsync_core::{Asset, Record};
use std::path::PathBuf;

use super::with_retry;

#[derive(Debug, Clone)]
pub struct UploadArgs {
    pub path: PathBuf,
    pub record_type: String,
    pub record_name: String,
    pub field: String,
    pub out: Option<PathBuf>,
}

pub async fn run_upload(cfg: &AssetSyncConfig, ledger: &ReceiptLedger, args: UploadArgs) -> Result<()> {
    if !args.path.is_file() {
        anyhow::bail!("not a file: {}", args.path.display());
    }

    let cfg = cfg.clone();
    let job = args.clone();
    let (asset, record) = tokio::task::spawn_blocking(move || -> Result<(Asset, Record)> {
        let channel = channel::from_config(&cfg)?;
        let mut asset = Asset::from_file(&job.path);
        let mut record = Record::new(job.record_type, job.record_name);
        with_retry(&cfg, || {
            asset
                .upload_synchronously_into_record(&mut record, &job.field, &channel)
                .map(|_| ())
        })
        .with_context(|| format!("upload {}", job.path.display()))?;
        Ok((asset, record))
    })
    .await??;

    let entry = NewReceipt::from_uploaded(record.record_type(), record.record_name(), &args.field, &asset)
        .context("upload finished without a receipt")?;
    ledger.record_upload(&entry).await?;

    let meta = record
        .asset(&args.field)
        .context("record field was not set by the upload")?;
    let json = meta.to_json_pretty()?;
    match &args.out {
        Some(out) => {
            storage::write_atomically(out, json.as_bytes())
                .with_context(|| format!("write metadata to {}", out.display()))?;
            eprintln!("Uploaded {} (receipt {})", args.path.display(), entry.receipt);
            eprintln!("Metadata written to {}; it contains the wrapping key.", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
