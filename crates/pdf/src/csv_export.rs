//! Temporary CSV dumps of extracted tables.

use locker_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Write table rows as CSV with every field quoted. Missing cells are written
/// as empty fields.
pub fn write_table_csv(path: &Path, rows: &[Vec<Option<String>>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| Error::CsvError(format!("Failed to create {}: {}", path.display(), e)))?;

    for row in rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(|e| Error::CsvError(format!("Failed to write row: {}", e)))?;
    }

    // Check for error rather than implicitly flushing and ignoring.
    writer.flush()?;
    Ok(())
}

/// Files removed when the set is dropped, on every exit path.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a file. Register before creating it so a partial write is also
    /// removed.
    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            log::debug!("Cleaning up {} CSV files", self.paths.len());
        }
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("Deleted {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to delete {}: {}", path.display(), e),
            }
        }
    }
}
