//! Global constants for the rapid-extractor application.
//!
//! Buffer sizes, output file names and the fixed text of the manifest and
//! tree listing formats live here so that writers and tests agree on them.

// Buffer size constants
/// Read buffer for digest calculation (1MB)
pub const DIGEST_BUFFER_SIZE: usize = 1024 * 1024;

/// Chunk size for compression operations (512KB)
pub const COMPRESSION_CHUNK_SIZE: usize = 512 * 1024;

/// Upper bound on compression worker threads
pub const MAX_COMPRESSION_WORKERS: usize = 8;

/// Bounded queue length between the archive scanner and its workers
pub const COMPRESSION_QUEUE_DEPTH: usize = 1000;

/// Large file threshold for compression decisions (100MB)
pub const LARGE_FILE_COMPRESSION_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default number of processed entries between progress log lines
pub const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Faults kept with full detail per run; later ones are only counted
pub const MAX_RECORDED_FAULTS: usize = 10_000;

/// Faults listed individually in the end-of-run report
pub const FAULT_REPORT_LIMIT: usize = 50;

// Manifest format
/// Header row of every manifest, in column order
pub const MANIFEST_HEADER: [&str; 5] = [
    "File Name",
    "File Path",
    "Creation Date",
    "Last Access Date",
    "Digest",
];

/// Digest column value when a file could not be hashed
pub const DIGEST_UNAVAILABLE: &str = "UNAVAILABLE";

// Tree listing format
pub const TREE_BRANCH: &str = "├── ";
pub const TREE_LAST_BRANCH: &str = "└── ";
pub const TREE_PIPE_PREFIX: &str = "│   ";
pub const TREE_SPACE_PREFIX: &str = "    ";

pub const TREE_FAULT_PERMISSION_DENIED: &str = "[Permission Denied]";
pub const TREE_FAULT_NOT_FOUND: &str = "[File Not Found]";
pub const TREE_FAULT_UNREADABLE: &str = "[Unreadable]";

// Output layout
pub const RESULTS_DIR_NAME: &str = "extraction_results";
pub const LOGS_DIR_NAME: &str = "logs";
pub const LOG_FILE_NAME: &str = "extraction.log";
pub const RUN_SUMMARY_FILE_NAME: &str = "run_summary.json";
pub const DIR_TREE_FILE_NAME: &str = "dir_tree.txt";
pub const PROCESS_LIST_FILE_NAME: &str = "running_processes.txt";
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Default base directory for case output
pub const DEFAULT_OUTPUT_BASE: &str = "cases";

// Common file extensions
pub const COMPRESSED_EXTENSIONS: &[&str] = &[
    "zip", "gz", "xz", "bz2", "7z", "rar", "jpg", "jpeg", "png", "gif", "mp3", "mp4", "avi", "mov",
    "mpg", "mpeg",
];
