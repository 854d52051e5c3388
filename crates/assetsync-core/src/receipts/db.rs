//! SQLite-backed receipt ledger: connection, schema, reads and writes.

use anyhow::Result;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::types::{NewReceipt, ReceiptEntry, ReceiptId};
use crate::asset::{Receipt, RemoteLocator};
use crate::checksum::Checksum;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}?mode=rwc", out)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Handle to the receipt ledger.
///
/// Stored at `~/.local/state/assetsync/receipts.db` by default.
#[derive(Clone)]
pub struct ReceiptLedger {
    pool: Pool<Sqlite>,
}

impl ReceiptLedger {
    /// Open (or create) the default ledger and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("assetsync")?;
        let db_path = xdg_dirs.place_state_file("receipts.db")?;
        Self::open_at(db_path).await
    }

    /// Open (or create) the ledger at `path`, creating parent dirs as needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(&path_to_sqlite_uri(path))
            .await?;
        let ledger = ReceiptLedger { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    #[cfg(test)]
    pub(crate) async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let ledger = ReceiptLedger { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS receipts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record_type TEXT NOT NULL,
                record_name TEXT NOT NULL,
                field TEXT NOT NULL,
                receipt TEXT NOT NULL,
                reference_checksum TEXT NOT NULL,
                size INTEGER NOT NULL,
                locator TEXT,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS receipts_by_receipt ON receipts (receipt);")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Append one accepted upload. Returns the row id.
    pub async fn record_upload(&self, entry: &NewReceipt) -> Result<ReceiptId> {
        let id = sqlx::query(
            r#"
            INSERT INTO receipts (
                record_type, record_name, field, receipt,
                reference_checksum, size, locator, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&entry.record_type)
        .bind(&entry.record_name)
        .bind(&entry.field)
        .bind(entry.receipt.as_str())
        .bind(entry.reference_checksum.as_str())
        .bind(entry.size as i64)
        .bind(entry.locator.as_ref().map(|l| l.as_str()))
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        tracing::debug!(id, receipt = %entry.receipt, "receipt recorded");
        Ok(id)
    }

    /// All entries, oldest first.
    pub async fn list_receipts(&self) -> Result<Vec<ReceiptEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, record_type, record_name, field, receipt,
                   reference_checksum, size, locator, created_at
            FROM receipts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(entry_from_row).collect())
    }

    /// Most recent entry carrying `receipt`, if any.
    pub async fn find_by_receipt(&self, receipt: &Receipt) -> Result<Option<ReceiptEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, record_type, record_name, field, receipt,
                   reference_checksum, size, locator, created_at
            FROM receipts
            WHERE receipt = ?1
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(receipt.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(entry_from_row))
    }
}

fn entry_from_row(row: &SqliteRow) -> ReceiptEntry {
    let size: i64 = row.get("size");
    let locator: Option<String> = row.get("locator");
    ReceiptEntry {
        id: row.get("id"),
        record_type: row.get("record_type"),
        record_name: row.get("record_name"),
        field: row.get("field"),
        receipt: Receipt::new(row.get::<String, _>("receipt")),
        reference_checksum: Checksum::new(row.get::<String, _>("reference_checksum")),
        size: size.max(0) as u64,
        locator: locator.map(RemoteLocator::new),
        created_at: row.get("created_at"),
    }
}
