use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as AnyhowContext, Result};
use log::{debug, info};
use sysinfo::{PidExt, ProcessExt, ProcessStatus, System, SystemExt};

use crate::collectors::volatile::models::ProcessInfo;
use crate::constants::PROCESS_LIST_FILE_NAME;

/// Collector for the running process list
pub struct ProcessSnapshotCollector {
    system: System,
}

impl Default for ProcessSnapshotCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSnapshotCollector {
    pub fn new() -> Self {
        debug!("Initializing process snapshot collector");
        let mut system = System::new();
        system.refresh_processes();
        Self { system }
    }

    /// Current processes ordered by PID
    pub fn collect_processes(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let status = match process.status() {
                    ProcessStatus::Run => "Running",
                    ProcessStatus::Sleep => "Sleeping",
                    ProcessStatus::Stop => "Stopped",
                    ProcessStatus::Zombie => "Zombie",
                    ProcessStatus::Idle => "Idle",
                    _ => "Unknown",
                };

                ProcessInfo {
                    pid: pid.as_u32(),
                    parent_pid: process.parent().map(|p| p.as_u32()),
                    name: process.name().to_string(),
                    cmd: process.cmd().to_vec(),
                    status: status.to_string(),
                    memory_kib: process.memory() / 1024,
                }
            })
            .collect();

        processes.sort_by_key(|p| p.pid);
        processes
    }

    /// Write `running_processes.txt` into `output_dir`, returning its path
    pub fn save_snapshot(&self, output_dir: &Path) -> Result<(PathBuf, usize)> {
        fs::create_dir_all(output_dir).context(format!(
            "Failed to create process output directory {}",
            output_dir.display()
        ))?;

        let processes = self.collect_processes();
        let output_file = output_dir.join(PROCESS_LIST_FILE_NAME);
        fs::write(&output_file, format_process_table(&processes))
            .context(format!("Failed to write {}", output_file.display()))?;

        info!(
            "Saved {} running processes to {}",
            processes.len(),
            output_file.display()
        );
        Ok((output_file, processes.len()))
    }
}

/// Render processes as a fixed-width text table, one line per process
pub fn format_process_table(processes: &[ProcessInfo]) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:>8} {:>8} {:>12} {:<9} {:<32} COMMAND",
        "PID", "PPID", "MEM_KIB", "STATUS", "NAME"
    );

    for process in processes {
        let parent = process
            .parent_pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            table,
            "{:>8} {:>8} {:>12} {:<9} {:<32} {}",
            process.pid,
            parent,
            process.memory_kib,
            process.status,
            single_line(&process.name),
            single_line(&process.cmd.join(" "))
        );
    }

    table
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
