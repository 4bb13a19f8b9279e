//! # rapid-extractor
//!
//! Live forensic artifact extraction for incident response and casework.
//!
//! ## Overview
//!
//! rapid-extractor collects artifacts (prefetch files, browser history
//! databases, remote-access tool logs, application logs, installed program
//! names, the running process list and a full directory listing) from a live
//! machine into a case folder. Every collected file is copied with its
//! timestamps, hashed with SHA-256 and recorded in a CSV manifest; each
//! module's output is then sealed into its own ZIP archive.
//!
//! ## Usage
//!
//! ```no_run
//! use rapid_extractor::collectors::task::{run_tasks, OutputLayout, RunContext};
//! use rapid_extractor::config::ExtractionConfig;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = ExtractionConfig::default();
//! let layout = OutputLayout::for_today(Path::new("cases"), "Nightfall", "LAPTOP-01");
//! layout.create()?;
//!
//! let ctx = RunContext::new("Nightfall", "LAPTOP-01", layout);
//! let outcomes = run_tasks(&config.tasks, &ctx, false);
//! println!("{} tasks finished", outcomes.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`models`]: Manifest records, digests, faults and task outcomes
//! - [`collectors`]: Collector, tree renderer, process snapshot and task runner
//! - [`config`]: YAML task definitions and OS defaults
//! - [`utils`]: Hashing, manifests, archiving and the run summary
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// Artifact collectors and the task runner
pub mod collectors;

/// Utility functions for hashing, manifests and compression
pub mod utils;

/// Configuration management and task definitions
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
