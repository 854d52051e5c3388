use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// `[retry]` section: whole-transfer retries for network failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per transfer, including the first.
    pub max_attempts: u32,
    /// First backoff step in seconds; doubles per attempt.
    pub base_delay_secs: f64,
    /// Backoff ceiling in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Transfer channel backend: a local directory store or an HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelBackend {
    #[default]
    Directory,
    Http,
}

/// Global configuration loaded from `~/.config/assetsync/config.toml`.
/// Keys missing from the file take their default values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSyncConfig {
    /// Channel backend: "directory" (default) or "http".
    pub channel: ChannelBackend,
    /// Base URL of the asset server; required for the http backend.
    pub endpoint: Option<String>,
    /// Root of the directory store; defaults to `~/.local/share/assetsync/store`.
    pub store_dir: Option<PathBuf>,
    /// Download chunk size in bytes for local channels.
    pub chunk_size: usize,
    /// Connect timeout for the http backend, in seconds.
    pub connect_timeout_secs: u64,
    /// Hard cap on a single http transfer, in seconds.
    pub transfer_timeout_secs: u64,
    /// Optional retry policy; if missing, transfers are not retried.
    pub retry: Option<RetryConfig>,
}

impl Default for AssetSyncConfig {
    fn default() -> Self {
        Self {
            channel: ChannelBackend::Directory,
            endpoint: None,
            store_dir: None,
            chunk_size: 64 * 1024,
            connect_timeout_secs: 30,
            transfer_timeout_secs: 3600,
            retry: None,
        }
    }
}

impl AssetSyncConfig {
    /// `store_dir` if set, else the XDG data dir default.
    pub fn resolved_store_dir(&self) -> Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let xdg_dirs = xdg::BaseDirectories::with_prefix("assetsync")?;
                Ok(xdg_dirs.create_data_directory("store")?)
            }
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("assetsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Parse the config file at `path`.
pub fn load_from(path: &Path) -> Result<AssetSyncConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&data).with_context(|| format!("parse {}", path.display()))
}

/// Load the user config, writing a default file on first run.
pub fn load_or_init() -> Result<AssetSyncConfig> {
    let path = config_path()?;
    if path.exists() {
        return load_from(&path);
    }
    let cfg = AssetSyncConfig::default();
    fs::write(&path, toml::to_string_pretty(&cfg)?)
        .with_context(|| format!("write default config {}", path.display()))?;
    tracing::info!("created default config at {}", path.display());
    Ok(cfg)
}
