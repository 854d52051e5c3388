//! `assetsync download <meta.json> --out <path>` – fetch, decrypt, verify, write.

use anyhow::{Context, Result};
use assetsync_core::channel;
use assetsync_core::config::AssetSyncConfig;
use assetsync_core::storage;
use assetsync_core::Asset;
use std::io::Write;
use std::path::Path;

use super::with_retry;

pub async fn run_download(cfg: &AssetSyncConfig, metadata: &Path, out: &Path) -> Result<()> {
    let json = std::fs::read_to_string(metadata)
        .with_context(|| format!("read metadata {}", metadata.display()))?;
    let mut asset = Asset::from_json(&json)
        .with_context(|| format!("parse metadata {}", metadata.display()))?;

    let cfg = cfg.clone();
    let asset = tokio::task::spawn_blocking(move || -> Result<Asset> {
        let channel = channel::from_config(&cfg)?;
        with_retry(&cfg, || {
            let mut shown = None;
            asset
                .download_synchronously(&channel, |fraction| {
                    let pct = (fraction * 100.0) as u32;
                    if shown != Some(pct) {
                        shown = Some(pct);
                        eprint!("\r{pct:>3}%");
                        let _ = std::io::stderr().flush();
                    }
                })
                .as_result()
                .map(|_| ())
                .map_err(|e| e.clone())
        })?;
        eprintln!();
        Ok(asset)
    })
    .await??;

    let content = asset
        .local_content()
        .context("download finished without content")?
        .read()?;
    storage::write_atomically(out, &content)
        .with_context(|| format!("write {}", out.display()))?;
    if let Some(sum) = asset.file_checksum() {
        println!("{}  {}", sum, out.display());
    }
    Ok(())
}
