use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use rapid_extractor::cli::{Args, Commands};
use rapid_extractor::collectors::task::{run_tasks, OutputLayout, RunContext};
use rapid_extractor::config::{load_or_default, ExtractionConfig};
use rapid_extractor::models::TaskOutcome;
use rapid_extractor::utils::summary::write_run_summary;

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(cmd) = &args.command {
        initialize_logging(args.verbose, None)?;
        return handle_subcommand(cmd);
    }

    let config = load_or_default(args.config.as_deref())?;

    if args.list_tasks {
        print_tasks(&config);
        return Ok(());
    }

    let case_name = args.case.clone().ok_or_else(|| anyhow!("A case name is required"))?;
    let device_arg = args.device.clone().ok_or_else(|| anyhow!("A device name is required"))?;
    let hostname = local_hostname();
    let device_name = if device_arg == "-" { hostname.clone() } else { device_arg };

    // The log file lives inside the case folder, so the layout comes first
    let layout = OutputLayout::for_today(&args.output, &case_name, &device_name);
    layout.create()?;
    initialize_logging(args.verbose, Some(&layout.log_file()))?;

    info!("Starting extraction for case '{}' on device '{}'", case_name, device_name);
    info!("Results directory: {}", layout.results_dir.display());

    let tasks = config.select(&args.modules)?;
    if tasks.is_empty() {
        warn!("No modules selected; nothing to do");
        return Ok(());
    }
    info!(
        "Selected modules: {}",
        tasks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>().join(", ")
    );

    let summary_path = layout.summary_file();
    let mut ctx = RunContext::new(&case_name, &device_name, layout);
    if let Some(interval) = progress_interval(&config) {
        ctx = ctx.with_progress_interval(interval);
    }

    let outcomes = run_tasks(&tasks, &ctx, args.parallel);

    ctx.faults.report();
    write_run_summary(&summary_path, &ctx, &hostname, &outcomes)?;
    log_outcomes(&outcomes);

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 && args.strict {
        return Err(anyhow!("{} of {} modules failed", failed, outcomes.len()));
    }

    info!("Extraction finished");
    Ok(())
}

/// Initialize terminal logging, plus a debug-level log file when given
fn initialize_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open log file {}", path.display()))?;

        let file_config = ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_target_level(LevelFilter::Error)
            .build();
        loggers.push(WriteLogger::new(LevelFilter::Debug, file_config, file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands (init-config)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path, target_os } => {
            let os = target_os
                .as_ref()
                .map(|os| os.to_string())
                .unwrap_or_else(|| std::env::consts::OS.to_string());

            info!("Creating {} configuration file at {}", os, path.display());
            ExtractionConfig::create_os_specific_config_file(path, &os)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}

fn print_tasks(config: &ExtractionConfig) {
    println!("{}", config.description);
    for task in &config.tasks {
        println!(
            "  {:<20} {:<18} {}",
            task.id,
            task.kind.to_string(),
            task.description.as_deref().unwrap_or("")
        );
    }
}

fn progress_interval(config: &ExtractionConfig) -> Option<u64> {
    let raw = config.global_options.get("progress_interval")?;
    match raw.parse() {
        Ok(interval) => Some(interval),
        Err(_) => {
            warn!("Ignoring invalid progress_interval '{}'", raw);
            None
        }
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown-host".to_string())
}

fn log_outcomes(outcomes: &[TaskOutcome]) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for outcome in outcomes {
        if outcome.success {
            info!(
                "  ✓ {:<20} {:>6} records {:>4} faults {:>8.2}s",
                outcome.task_id, outcome.records, outcome.faults, outcome.elapsed_seconds
            );
        } else {
            error!(
                "  ✗ {:<20} failed after {:.2}s: {}",
                outcome.task_id,
                outcome.elapsed_seconds,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
