//! Test utilities for rapid-extractor
//!
//! Common fixtures shared by the unit test modules.

#![cfg(test)]

use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

/// Creates a temporary file with the given content
pub fn create_temp_file(content: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    use std::io::Write;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Creates a test file structure in a temporary directory.
///
/// Five regular files over three directory levels.
pub fn create_test_file_structure() -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let base_path = temp_dir.path();

    fs::create_dir_all(base_path.join("dir1/subdir1"))?;
    fs::create_dir_all(base_path.join("dir2"))?;

    fs::write(base_path.join("file1.txt"), b"Test content 1")?;
    fs::write(base_path.join("file2.log"), b"Test log content")?;
    fs::write(base_path.join("dir1/file3.txt"), b"Test content 3")?;
    fs::write(base_path.join("dir1/subdir1/file4.txt"), b"Test content 4")?;
    fs::write(base_path.join("dir2/file5.log"), b"Another log file")?;

    Ok(temp_dir)
}

/// Creates a test YAML configuration collecting `source` as one task
pub fn create_test_config(source: &Path) -> Result<NamedTempFile> {
    let config_content = format!(
        r#"
version: "1.0"
description: "Test configuration"
global_options:
  progress_interval: "10"
tasks:
  - id: "logs"
    kind: Collect
    output_name: "Logs_export"
    manifest_name: "log_files.csv"
    include_pattern: '\.log$'
    sources:
      - path: '{}'
        label: "Logs"
"#,
        source.display()
    );

    create_temp_file(config_content.as_bytes())
}

/// Test data generators for common types
pub mod generators {
    use crate::models::{Digest, FileRecord};

    pub fn file_record(name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            source_path: format!("/evidence/{}", name),
            created_at: Some(1_700_000_000.0),
            last_accessed_at: Some(1_700_000_100.5),
            digest: Digest::Hex("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".into()),
        }
    }
}
