//! CLI command handlers, one per file.

mod checksum;
mod download;
mod keygen;
mod receipts;
mod upload;

pub use checksum::run_checksum;
pub use download::run_download;
pub use keygen::run_keygen;
pub use receipts::run_receipts;
pub use upload::{run_upload, UploadArgs};

use assetsync_core::config::AssetSyncConfig;
use assetsync_core::retry::{run_with_retry, RetryPolicy};
use assetsync_core::AssetError;

/// Run `f` once, or under the configured retry policy when `[retry]` is set.
fn with_retry<T, F>(cfg: &AssetSyncConfig, mut f: F) -> Result<T, AssetError>
where
    F: FnMut() -> Result<T, AssetError>,
{
    match &cfg.retry {
        Some(retry) => run_with_retry(&RetryPolicy::from(retry), f),
        None => f(),
    }
}
