use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde_json::json;

use crate::collectors::task::RunContext;
use crate::models::TaskOutcome;

/// Create a JSON summary of the run.
///
/// The summary is written next to the task archives and documents which
/// modules ran, what they produced, and how many entries could not be
/// collected.
///
/// # Example Output
///
/// ```json
/// {
///   "collection_id": "550e8400-e29b-41d4-a716-446655440000",
///   "case": "Nightfall",
///   "device": "LAPTOP-01",
///   "hostname": "LAPTOP-01",
///   "collection_time": "2024-01-15T14:30:52+01:00",
///   "tasks": [...],
///   "total_faults": 3
/// }
/// ```
pub fn create_run_summary(ctx: &RunContext, hostname: &str, outcomes: &[TaskOutcome]) -> Result<String> {
    let tasks: Vec<_> = outcomes
        .iter()
        .map(|outcome| {
            json!({
                "task": outcome.task_id,
                "success": outcome.success,
                "error": outcome.error,
                "records": outcome.records,
                "faults": outcome.faults,
                "archive": outcome
                    .archive_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().to_string()),
                "elapsed_seconds": outcome.elapsed_seconds,
            })
        })
        .collect();

    let faults: Vec<_> = ctx
        .faults
        .faults()
        .into_iter()
        .map(|fault| {
            json!({
                "task": fault.task_id,
                "path": fault.path.to_string_lossy(),
                "kind": fault.kind.to_string(),
                "message": fault.message,
            })
        })
        .collect();

    let summary = json!({
        "collection_id": ctx.run_id.to_string(),
        "case": ctx.case_name,
        "device": ctx.device_name,
        "hostname": hostname,
        "collection_time": ctx.started_at.to_rfc3339(),
        "os": std::env::consts::OS,
        "collector_version": env!("CARGO_PKG_VERSION"),
        "tasks_succeeded": outcomes.iter().filter(|o| o.success).count(),
        "tasks_failed": outcomes.iter().filter(|o| !o.success).count(),
        "tasks": tasks,
        "total_faults": ctx.faults.total(),
        "faults_omitted": ctx.faults.total().saturating_sub(faults.len()),
        "faults": faults,
    });

    serde_json::to_string_pretty(&summary).context("Failed to serialize run summary to JSON")
}

/// Write the run summary to `path`
pub fn write_run_summary(
    path: &Path,
    ctx: &RunContext,
    hostname: &str,
    outcomes: &[TaskOutcome],
) -> Result<()> {
    let summary = create_run_summary(ctx, hostname, outcomes)?;
    fs::write(path, summary).context(format!("Failed to write run summary to {}", path.display()))?;
    info!("Run summary written to {}", path.display());
    Ok(())
}
