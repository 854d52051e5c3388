//! Local file lifecycle for materialized content and directory-backed blobs.
//!
//! Content is written to a uniquely named `.part` temp file next to its
//! destination, synced, and atomically renamed into place, so a reader never
//! observes a partial file.

mod staged;

pub use staged::StagedFile;

use std::io;
use std::path::Path;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Write `data` to `final_path` through a synced temp file and rename.
pub fn write_atomically(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let mut staged = StagedFile::create(final_path)?;
    staged.write_chunk(data)?;
    staged.sync()?;
    staged.finalize()
}
