use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::constants::DEFAULT_OUTPUT_BASE;

/// Command-line arguments for rapid-extractor.
///
/// A run needs a case name and a device name; together with the date they
/// name the case folder that receives one archive per module.
#[derive(Parser, Debug)]
#[clap(
    name = "rapid-extractor",
    version,
    about = "Live forensic artifact extraction",
    subcommand_negates_reqs = true
)]
pub struct Args {
    /// Case or operation name
    #[clap(required_unless_present = "list_tasks")]
    pub case: Option<String>,

    /// Device name; `-` uses this machine's hostname
    #[clap(required_unless_present = "list_tasks")]
    pub device: Option<String>,

    /// Modules to run (comma-separated task ids, default: all)
    #[clap(short, long, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Base directory for case folders
    #[clap(short, long, default_value = DEFAULT_OUTPUT_BASE)]
    pub output: PathBuf,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Run independent modules concurrently
    #[clap(long)]
    pub parallel: bool,

    /// Exit with an error status if any module fails
    #[clap(long)]
    pub strict: bool,

    /// List the configured modules and exit
    #[clap(long)]
    pub list_tasks: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Target operating system for generated configuration
#[derive(Clone, Debug, ValueEnum, PartialEq)]
pub enum TargetOS {
    /// Microsoft Windows
    Windows,
    /// Linux distributions
    Linux,
    /// Apple macOS
    MacOS,
}

impl std::fmt::Display for TargetOS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetOS::Windows => write!(f, "windows"),
            TargetOS::Linux => write!(f, "linux"),
            TargetOS::MacOS => write!(f, "macos"),
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "config.yaml")]
        path: PathBuf,

        /// Target OS for the configuration (windows, linux, macos)
        #[clap(long)]
        target_os: Option<TargetOS>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_basic_args_parsing() {
        let args = Args::parse_from(&[
            "rapid-extractor",
            "Nightfall",
            "LAPTOP-01",
            "--modules", "prefetch,browser_history",
            "--output", "/mnt/evidence/cases",
            "--verbose",
        ]);

        assert_eq!(args.case.as_deref(), Some("Nightfall"));
        assert_eq!(args.device.as_deref(), Some("LAPTOP-01"));
        assert_eq!(args.modules, vec!["prefetch", "browser_history"]);
        assert_eq!(args.output, PathBuf::from("/mnt/evidence/cases"));
        assert!(args.verbose);
        assert!(!args.parallel);
        assert!(!args.strict);
    }

    #[test]
    fn test_default_values() {
        let args = Args::parse_from(&["rapid-extractor", "case", "-"]);

        assert!(args.modules.is_empty());
        assert_eq!(args.output, PathBuf::from("cases"));
        assert_eq!(args.config, None);
        assert!(args.command.is_none());
        assert!(!args.list_tasks);
    }

    #[test]
    fn test_case_and_device_required() {
        assert!(Args::try_parse_from(&["rapid-extractor"]).is_err());
        assert!(Args::try_parse_from(&["rapid-extractor", "only-case"]).is_err());
    }

    #[test]
    fn test_list_tasks_needs_no_case() {
        let args = Args::try_parse_from(&["rapid-extractor", "--list-tasks"]).unwrap();
        assert!(args.list_tasks);
        assert!(args.case.is_none());
    }

    #[test]
    fn test_init_config_command() {
        let args = Args::parse_from(&[
            "rapid-extractor",
            "init-config",
            "windows.yaml",
            "--target-os", "windows",
        ]);

        match args.command {
            Some(Commands::InitConfig { path, target_os }) => {
                assert_eq!(path, PathBuf::from("windows.yaml"));
                assert_eq!(target_os, Some(TargetOS::Windows));
            }
            _ => panic!("Expected InitConfig command"),
        }
    }

    #[test]
    fn test_target_os_display() {
        assert_eq!(TargetOS::Windows.to_string(), "windows");
        assert_eq!(TargetOS::Linux.to_string(), "linux");
        assert_eq!(TargetOS::MacOS.to_string(), "macos");
    }
}
