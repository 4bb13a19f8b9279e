//! Run-scoped fault tracking and reporting
//!
//! Per-entry faults (unreadable directories, files that could not be copied
//! or hashed) never abort a task. They are logged where they happen and
//! recorded here so the run can finish with a summary and guidance about
//! elevated privileges. Missing source roots are not faults; the collector
//! counts them in its own statistics.
//!
//! Counters are exact for the whole run. Only the first
//! [`MAX_RECORDED_FAULTS`] faults are kept with full detail.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;
use serde::Serialize;

use crate::constants::{FAULT_REPORT_LIMIT, MAX_RECORDED_FAULTS};
use crate::models::FaultKind;

/// One recorded fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub task_id: String,
    pub path: PathBuf,
    pub kind: FaultKind,
    pub message: String,
}

#[derive(Debug, Default)]
struct FaultLog {
    detailed: Vec<Fault>,
    total: usize,
    per_task: HashMap<String, usize>,
    permission_denied: usize,
}

/// Shared, internally synchronized record of the faults seen during a run.
///
/// Clones share the same underlying log, so one tracker can be handed to
/// tasks running in parallel.
#[derive(Debug, Clone, Default)]
pub struct FaultTracker {
    log: Arc<Mutex<FaultLog>>,
}

impl FaultTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FaultLog> {
        match self.log.lock() {
            Ok(log) => log,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record a fault for a task
    pub fn record(&self, task_id: &str, path: &Path, kind: FaultKind, message: impl Into<String>) {
        let mut log = self.lock();
        log.total += 1;
        *log.per_task.entry(task_id.to_string()).or_insert(0) += 1;
        if kind == FaultKind::PermissionDenied {
            log.permission_denied += 1;
        }
        if log.detailed.len() < MAX_RECORDED_FAULTS {
            log.detailed.push(Fault {
                task_id: task_id.to_string(),
                path: path.to_path_buf(),
                kind,
                message: message.into(),
            });
        }
    }

    /// Faults kept with full detail, in recording order
    pub fn faults(&self) -> Vec<Fault> {
        self.lock().detailed.clone()
    }

    pub fn total(&self) -> usize {
        self.lock().total
    }

    /// Number of faults recorded for one task
    pub fn count_for(&self, task_id: &str) -> usize {
        self.lock().per_task.get(task_id).copied().unwrap_or(0)
    }

    /// Number of permission faults across the run
    pub fn permission_failures(&self) -> usize {
        self.lock().permission_denied
    }

    /// Log a summary of recorded faults and, for permission problems, how to fix them
    pub fn report(&self) {
        let (listed, total, permission_denied) = {
            let log = self.lock();
            let listed: Vec<Fault> = log.detailed.iter().take(FAULT_REPORT_LIMIT).cloned().collect();
            (listed, log.total, log.permission_denied)
        };
        if total == 0 {
            return;
        }

        warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        warn!("Collection faults: {} entries could not be fully collected", total);
        warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        for fault in &listed {
            warn!("  • [{}] {} ({}): {}", fault.task_id, fault.path.display(), fault.kind, fault.message);
        }
        if total > listed.len() {
            warn!("  ... and {} more (see the log file and run summary)", total - listed.len());
        }

        if permission_denied > 0 {
            warn!("");
            warn!("{} entries were skipped due to insufficient permissions.", permission_denied);

            #[cfg(target_os = "windows")]
            warn!("  Re-run from an elevated prompt (right-click and 'Run as administrator').");

            #[cfg(not(target_os = "windows"))]
            warn!(
                "  Re-run with sudo: sudo {}",
                std::env::args().collect::<Vec<_>>().join(" ")
            );
        }

        warn!("Note: collection continued for accessible entries.");
    }
}
