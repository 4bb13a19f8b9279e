//! Artifact collection implementations.
//!
//! Every file-based module goes through the same [`collector::Collector`]:
//! configuration supplies the source roots, the collector copies, hashes and
//! records each file, and the task runner seals the result into an archive.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        task::run_tasks (orchestrator)    │
//! ├──────────────────────────────────────────┤
//! │  sources  →  Collector | TreeRenderer    │
//! │              structure | volatile        │
//! ├──────────────────────────────────────────┤
//! │        utils::compress::seal             │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use rapid_extractor::collectors::collector::{Collector, SourceRoot};
//! use rapid_extractor::utils::manifest::ManifestWriter;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut manifest = ManifestWriter::create(Path::new("/tmp/out/prefetch_files.csv"))?;
//! let stats = Collector::new("prefetch").collect(
//!     &[SourceRoot::labeled(r"C:\Windows\Prefetch", "Windows/Prefetch")],
//!     Path::new("/tmp/out"),
//!     &mut manifest,
//! )?;
//! manifest.finish()?;
//!
//! println!("Collected {} files", stats.files);
//! # Ok(())
//! # }
//! ```

/// Recursive copy, hash and manifest routine shared by all file tasks
pub mod collector;

/// Run-scoped fault tracking and reporting
pub mod fault_tracker;

/// Optional progress observers
pub mod progress;

/// Source specification resolution
pub mod sources;

/// Top-level directory mirroring
pub mod structure;

/// Task execution and output layout
pub mod task;

/// Directory tree listings
pub mod tree;

/// Volatile data collectors (running processes)
pub mod volatile;
