//! Volatile data collection
//!
//! Captures the running process list with the sysinfo crate and writes it as
//! a plain-text table. The snapshot is not hashed or recorded in a manifest.

mod collector;
pub mod models;

pub use collector::{format_process_table, ProcessSnapshotCollector};
pub use models::ProcessInfo;
