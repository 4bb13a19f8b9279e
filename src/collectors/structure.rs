//! Recreates the top-level directory names of a source as empty directories.
//!
//! Used for installed-program folders, where only the names are collected.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::collectors::collector::SourceRoot;
use crate::collectors::fault_tracker::FaultTracker;
use crate::models::FaultKind;

/// Mirror each root's immediate subdirectories into `destination_root/<label>`.
///
/// Returns the number of directories created. A missing or unlistable root
/// is logged and skipped.
pub fn mirror_top_level_dirs(
    task_id: &str,
    roots: &[SourceRoot],
    destination_root: &Path,
    faults: &FaultTracker,
) -> Result<u64> {
    fs::create_dir_all(destination_root).context(format!(
        "Failed to create destination root {}",
        destination_root.display()
    ))?;

    let mut created = 0;
    for root in roots {
        let base = root.destination_base(destination_root);
        fs::create_dir_all(&base).context(format!("Failed to create {}", base.display()))?;

        let entries = match fs::read_dir(&root.path) {
            Ok(entries) => entries,
            Err(e) => {
                let kind = FaultKind::from_io(&e);
                if kind == FaultKind::NotFound {
                    warn!("[{}] Source not found: {}", task_id, root.path.display());
                } else {
                    warn!("[{}] Cannot list {}: {}", task_id, root.path.display(), e);
                    faults.record(task_id, &root.path, kind, format!("Cannot list directory: {}", e));
                }
                continue;
            }
        };

        let mut names: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name())
            .collect();
        names.sort();

        for name in names {
            let target = base.join(&name);
            match fs::create_dir_all(&target) {
                Ok(()) => {
                    debug!("[{}] Mirrored {}", task_id, target.display());
                    created += 1;
                }
                Err(e) => warn!("[{}] Failed to create {}: {}", task_id, target.display(), e),
            }
        }

        info!("[{}] Mirrored top-level directories of {}", task_id, root.path.display());
    }

    Ok(created)
}
