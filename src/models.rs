use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::constants::DIGEST_UNAVAILABLE;

/// Content digest of a collected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Digest {
    /// Lowercase hex SHA-256
    Hex(String),
    /// Hashing failed; the manifest shows the sentinel instead
    Unavailable,
}

impl Digest {
    pub fn is_available(&self) -> bool {
        matches!(self, Digest::Hex(_))
    }

    pub fn as_hex(&self) -> Option<&str> {
        match self {
            Digest::Hex(hex) => Some(hex),
            Digest::Unavailable => None,
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Digest::Hex(hex) => write!(f, "{}", hex),
            Digest::Unavailable => write!(f, "{}", DIGEST_UNAVAILABLE),
        }
    }
}

/// One manifest row: evidence that a file was (or was attempted to be) collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub source_path: String,
    /// Seconds since the Unix epoch, read from the source before copying
    pub created_at: Option<f64>,
    pub last_accessed_at: Option<f64>,
    pub digest: Digest,
}

impl FileRecord {
    /// Build a record from a source path and the source metadata read before the copy.
    pub fn from_source(source: &Path, metadata: Option<&Metadata>, digest: Digest) -> Self {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.to_string_lossy().to_string());

        FileRecord {
            name,
            source_path: source.to_string_lossy().to_string(),
            created_at: metadata.and_then(creation_epoch),
            last_accessed_at: metadata
                .and_then(|m| m.accessed().ok())
                .and_then(system_time_to_epoch),
            digest,
        }
    }
}

/// Convert a `SystemTime` to fractional epoch seconds
pub fn system_time_to_epoch(time: SystemTime) -> Option<f64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs_f64())
}

/// Render an epoch value with microsecond precision, empty when unknown
pub fn format_epoch(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_default()
}

/// Birth time where the platform reports one, otherwise the inode change time
fn creation_epoch(metadata: &Metadata) -> Option<f64> {
    if let Some(created) = metadata.created().ok().and_then(system_time_to_epoch) {
        return Some(created);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Some(metadata.ctime() as f64 + metadata.ctime_nsec() as f64 / 1_000_000_000.0)
    }

    #[cfg(not(unix))]
    {
        None
    }
}

/// Classification of a per-entry filesystem fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    PermissionDenied,
    NotFound,
    Other,
}

impl FaultKind {
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => FaultKind::PermissionDenied,
            io::ErrorKind::NotFound => FaultKind::NotFound,
            _ => FaultKind::Other,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::PermissionDenied => write!(f, "permission denied"),
            FaultKind::NotFound => write!(f, "not found"),
            FaultKind::Other => write!(f, "I/O error"),
        }
    }
}

/// Per-task result reported by the orchestrator and written to the run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub records: u64,
    pub faults: u64,
    pub archive_path: Option<PathBuf>,
    pub elapsed_seconds: f64,
}
