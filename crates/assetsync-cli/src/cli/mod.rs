//! CLI for the assetsync transfer engine.

mod commands;

use anyhow::Result;
use assetsync_core::config;
use assetsync_core::receipts::ReceiptLedger;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_checksum, run_download, run_keygen, run_receipts, run_upload, UploadArgs};

/// Top-level CLI for assetsync.
#[derive(Debug, Parser)]
#[command(name = "assetsync")]
#[command(about = "assetsync: encrypted, checksum-verified asset transfer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Encrypt and upload a file into a record field; prints the asset metadata.
    Upload {
        /// File to upload.
        path: PathBuf,
        /// Record name the asset is attached to.
        #[arg(long)]
        record: String,
        /// Record type.
        #[arg(long, default_value = "Asset")]
        record_type: String,
        /// Field name within the record.
        #[arg(long, default_value = "file")]
        field: String,
        /// Write the metadata JSON here instead of stdout. It contains the wrapping key.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Download, decrypt, and verify an asset described by a metadata JSON file.
    Download {
        /// Metadata JSON as produced by `upload`.
        metadata: PathBuf,
        /// Destination file for the plaintext.
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },

    /// Compute the SHA-256 checksum of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// List receipts of past uploads.
    Receipts,

    /// Print a fresh base64 wrapping key.
    Keygen,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Upload {
                path,
                record,
                record_type,
                field,
                out,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let ledger = ReceiptLedger::open_default().await?;
                let args = UploadArgs {
                    path,
                    record_type,
                    record_name: record,
                    field,
                    out,
                };
                run_upload(&cfg, &ledger, args).await?;
            }
            CliCommand::Download { metadata, out } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_download(&cfg, &metadata, &out).await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Receipts => {
                let ledger = ReceiptLedger::open_default().await?;
                run_receipts(&ledger).await?;
            }
            CliCommand::Keygen => run_keygen(),
        }

        Ok(())
    }
}
