//! Utility functions for collected artifacts.
//!
//! ## Components
//!
//! - **Hashing**: streaming SHA-256 digests
//! - **Manifest**: per-task CSV audit log of collected files
//! - **Compression**: ZIP sealing of finished working directories
//! - **Summary**: JSON run summary
//!
//! ### Sealing a Directory
//!
//! ```no_run
//! use rapid_extractor::utils::compress::seal;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let archive = seal(Path::new("/cases/op_2024-01-01/pc/extraction_results/BET_export"), "BET_export")?;
//! println!("Created archive: {}", archive.display());
//! # Ok(())
//! # }
//! ```

/// Run summary generation
pub mod summary;

/// ZIP archive creation and sealing
pub mod compress;

/// Cryptographic hash calculation utilities
pub mod hash;

/// CSV manifest writer
pub mod manifest;
