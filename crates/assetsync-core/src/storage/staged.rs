//! Sequential temp-file writer with atomic finalize.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::TEMP_SUFFIX;

/// A uniquely named `.part` file next to its destination, filled sequentially.
/// Dropping it without calling [`StagedFile::finalize`] removes the temp file.
///
/// Each staged file gets its own temp name, so concurrent writers targeting
/// the same final path never share a temp file; the last rename wins.
pub struct StagedFile {
    temp: NamedTempFile,
    final_path: PathBuf,
    written: u64,
}

impl StagedFile {
    /// Create a fresh temp file for `final_path`. Parent directories are created.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let parent = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        let mut prefix = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        prefix.push(".");
        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)?;
        Ok(Self {
            temp,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.file_mut().write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file_mut().sync_all()
    }

    /// Close the temp file and rename it onto the final path, replacing any
    /// file already there.
    pub fn finalize(self) -> io::Result<()> {
        self.temp.persist(&self.final_path)?;
        Ok(())
    }

    fn file_mut(&mut self) -> &mut File {
        self.temp.as_file_mut()
    }
}
