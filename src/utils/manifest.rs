//! CSV manifest of collected files.
//!
//! One manifest exists per collection task. It is truncated on creation, the
//! header is written immediately, and rows are appended in discovery order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::constants::MANIFEST_HEADER;
use crate::models::{format_epoch, FileRecord};

/// Append-only writer for a task manifest.
///
/// Buffered output is flushed by [`ManifestWriter::finish`]; if the writer is
/// dropped early (a task failing part way) it is flushed on drop instead.
pub struct ManifestWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl ManifestWriter {
    /// Create (or truncate) the manifest and write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .context(format!("Failed to create manifest at {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        write_row(&mut writer, &MANIFEST_HEADER)
            .context(format!("Failed to write manifest header to {}", path.display()))?;

        debug!("Opened manifest {}", path.display());
        Ok(ManifestWriter {
            path: path.to_path_buf(),
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Append one record.
    pub fn append(&mut self, record: &FileRecord) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("Manifest {} already closed", self.path.display()))?;

        let created = format_epoch(record.created_at);
        let accessed = format_epoch(record.last_accessed_at);
        let digest = record.digest.to_string();

        write_row(
            writer,
            &[
                record.name.as_str(),
                record.source_path.as_str(),
                created.as_str(),
                accessed.as_str(),
                digest.as_str(),
            ],
        )
        .context(format!("Failed to append to manifest {}", self.path.display()))?;

        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far (header excluded)
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the manifest, returning its path.
    pub fn finish(mut self) -> Result<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .context(format!("Failed to flush manifest {}", self.path.display()))?;
        }
        debug!("Closed manifest {} with {} rows", self.path.display(), self.rows);
        Ok(self.path.clone())
    }
}

impl Drop for ManifestWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush manifest {}: {}", self.path.display(), e);
            }
        }
    }
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    // CRLF row terminator, as RFC 4180 and spreadsheet tools expect
    write!(writer, "{}\r\n", line)
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
