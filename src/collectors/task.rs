//! Running configured tasks: output layout, per-task execution and sealing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use log::{error, info};
use rayon::prelude::*;
use uuid::Uuid;

use crate::collectors::collector::{CollectionTask, Collector};
use crate::collectors::fault_tracker::FaultTracker;
use crate::collectors::progress::LogProgress;
use crate::collectors::sources::resolve_sources;
use crate::collectors::structure::mirror_top_level_dirs;
use crate::collectors::tree::TreeRenderer;
use crate::collectors::volatile::ProcessSnapshotCollector;
use crate::config::{TaskDefinition, TaskKind};
use crate::constants::{
    DIR_TREE_FILE_NAME, LOGS_DIR_NAME, LOG_FILE_NAME, PROGRESS_LOG_INTERVAL, RESULTS_DIR_NAME,
    RUN_SUMMARY_FILE_NAME,
};
use crate::models::TaskOutcome;
use crate::utils::compress::seal;

/// Directory layout of one run:
/// `<base>/<case>_<date>/<device>/{extraction_results,logs}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub case_dir: PathBuf,
    pub device_dir: PathBuf,
    pub results_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl OutputLayout {
    pub fn new(base: &Path, case_name: &str, device_name: &str, date: NaiveDate) -> Self {
        let case_dir = base.join(format!(
            "{}_{}",
            sanitize_component(case_name),
            date.format("%Y-%m-%d")
        ));
        let device_dir = case_dir.join(sanitize_component(device_name));

        OutputLayout {
            results_dir: device_dir.join(RESULTS_DIR_NAME),
            logs_dir: device_dir.join(LOGS_DIR_NAME),
            case_dir,
            device_dir,
        }
    }

    /// Layout dated with today's local date
    pub fn for_today(base: &Path, case_name: &str, device_name: &str) -> Self {
        Self::new(base, case_name, device_name, Local::now().date_naive())
    }

    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.results_dir).context(format!(
            "Failed to create results directory {}",
            self.results_dir.display()
        ))?;
        fs::create_dir_all(&self.logs_dir).context(format!(
            "Failed to create log directory {}",
            self.logs_dir.display()
        ))?;
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(LOG_FILE_NAME)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.results_dir.join(RUN_SUMMARY_FILE_NAME)
    }

    /// Working directory of a task; sealed into `<output_name>.zip` beside it
    pub fn working_dir(&self, task: &TaskDefinition) -> PathBuf {
        self.results_dir.join(sanitize_component(&task.output_name))
    }
}

/// Make a free-text label safe to use as a single path component
pub fn sanitize_component(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => cleaned,
    }
}

/// Everything a task needs to know about the run it belongs to
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub case_name: String,
    pub device_name: String,
    pub started_at: DateTime<Local>,
    pub layout: OutputLayout,
    pub faults: FaultTracker,
    pub progress_interval: u64,
}

impl RunContext {
    pub fn new(case_name: &str, device_name: &str, layout: OutputLayout) -> Self {
        RunContext {
            run_id: Uuid::new_v4(),
            case_name: case_name.to_string(),
            device_name: device_name.to_string(),
            started_at: Local::now(),
            layout,
            faults: FaultTracker::new(),
            progress_interval: PROGRESS_LOG_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

/// Run one task to completion and seal its output. Never panics or returns
/// an error: failures are reported in the outcome.
pub fn run_task(task: &TaskDefinition, ctx: &RunContext) -> TaskOutcome {
    info!("Starting {} extraction ({})...", task.id, task.kind);
    let start = Instant::now();

    let result = execute_task(task, ctx);
    let elapsed_seconds = start.elapsed().as_secs_f64();
    let faults = ctx.faults.count_for(&task.id) as u64;

    match result {
        Ok((records, archive_path)) => {
            info!(
                "{} extraction completed in {:.2} seconds ({} records, {} faults) -> {}",
                task.id,
                elapsed_seconds,
                records,
                faults,
                archive_path.display()
            );
            TaskOutcome {
                task_id: task.id.clone(),
                success: true,
                error: None,
                records,
                faults,
                archive_path: Some(archive_path),
                elapsed_seconds,
            }
        }
        Err(e) => {
            error!(
                "Error during {} extraction after {:.2} seconds: {:#}",
                task.id, elapsed_seconds, e
            );
            TaskOutcome {
                task_id: task.id.clone(),
                success: false,
                error: Some(format!("{:#}", e)),
                records: 0,
                faults,
                archive_path: None,
                elapsed_seconds,
            }
        }
    }
}

fn execute_task(task: &TaskDefinition, ctx: &RunContext) -> Result<(u64, PathBuf)> {
    let working_dir = ctx.layout.working_dir(task);
    let observer = LogProgress::with_interval(task.id.clone(), ctx.progress_interval);

    let records = match task.kind {
        TaskKind::Collect => {
            let mut collector = Collector::new(task.id.clone())
                .with_fault_tracker(ctx.faults.clone())
                .with_observer(&observer);
            if let Some(pattern) = &task.include_pattern {
                collector = collector.with_include_pattern(pattern)?;
            }

            let collection = CollectionTask {
                source_roots: resolve_sources(&task.sources),
                manifest_path: working_dir.join(task.manifest_file_name()),
                destination_root: working_dir.clone(),
            };
            collector.run(&collection)?.files
        }
        TaskKind::DirectoryTree => {
            let root = resolve_sources(&task.sources)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("Task '{}' has no directory to list", task.id))?;

            TreeRenderer::new(task.id.clone())
                .with_fault_tracker(ctx.faults.clone())
                .with_observer(&observer)
                .render_to_file(&root.path, &working_dir.join(DIR_TREE_FILE_NAME))?
                .entries
        }
        TaskKind::Processes => {
            let (_, count) = ProcessSnapshotCollector::new().save_snapshot(&working_dir)?;
            count as u64
        }
        TaskKind::StructureMirror => mirror_top_level_dirs(
            &task.id,
            &resolve_sources(&task.sources),
            &working_dir,
            &ctx.faults,
        )?,
    };

    let archive_path = seal(&working_dir, &task.output_name)?;
    Ok((records, archive_path))
}

/// Run tasks one after another, or concurrently when `parallel` is set.
/// Outcomes are returned in task order either way.
pub fn run_tasks(tasks: &[TaskDefinition], ctx: &RunContext, parallel: bool) -> Vec<TaskOutcome> {
    if parallel {
        info!(
            "Running {} tasks in parallel on up to {} threads",
            tasks.len(),
            rayon::current_num_threads()
        );
        tasks.par_iter().map(|task| run_task(task, ctx)).collect()
    } else {
        tasks.iter().map(|task| run_task(task, ctx)).collect()
    }
}
