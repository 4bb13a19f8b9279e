use std::collections::HashMap;

use crate::config::extraction_config::{ExtractionConfig, TaskDefinition};
use crate::config::task_types::{SourceSpec, TaskKind};

fn collect_task(
    id: &str,
    output_name: &str,
    manifest_name: &str,
    sources: Vec<SourceSpec>,
    description: &str,
) -> TaskDefinition {
    TaskDefinition {
        id: id.into(),
        kind: TaskKind::Collect,
        output_name: output_name.into(),
        manifest_name: Some(manifest_name.into()),
        sources,
        include_pattern: None,
        description: Some(description.into()),
    }
}

fn dir_tree_task(root: &str) -> TaskDefinition {
    TaskDefinition {
        id: "dir_tree".into(),
        kind: TaskKind::DirectoryTree,
        output_name: "DirTree_export".into(),
        manifest_name: None,
        sources: vec![SourceSpec::path(root)],
        include_pattern: None,
        description: Some(format!("Text listing of every entry under {}", root)),
    }
}

fn processes_task() -> TaskDefinition {
    TaskDefinition {
        id: "processes".into(),
        kind: TaskKind::Processes,
        output_name: "Processes_export".into(),
        manifest_name: None,
        sources: Vec::new(),
        include_pattern: None,
        description: Some("Snapshot of running processes".into()),
    }
}

impl ExtractionConfig {
    /// Default configuration for Windows
    pub fn default_windows() -> Self {
        let mut teamviewer = collect_task(
            "teamviewer",
            "TeamViewer_export",
            "teamviewer_files.csv",
            vec![SourceSpec::path(r"C:\Program Files (x86)\TeamViewer")],
            "TeamViewer connection lists and log files",
        );
        teamviewer.include_pattern = Some(r"\.(txt|log)$".into());

        ExtractionConfig {
            version: "1.0".into(),
            description: "Default Windows live extraction configuration".into(),
            tasks: vec![
                collect_task(
                    "prefetch",
                    "Prefetch_export",
                    "prefetch_files.csv",
                    vec![SourceSpec::labeled(r"%WINDIR%\Prefetch", "Windows/Prefetch")],
                    "All prefetch files from %WINDIR%\\Prefetch",
                ),
                dir_tree_task(r"C:\"),
                processes_task(),
                TaskDefinition {
                    id: "installed_programs".into(),
                    kind: TaskKind::StructureMirror,
                    output_name: "InstalledPrograms_export".into(),
                    manifest_name: None,
                    sources: vec![
                        SourceSpec::labeled(r"C:\Program Files", "ProgramFiles"),
                        SourceSpec::labeled(r"C:\Program Files (x86)", "ProgramFiles_X86"),
                    ],
                    include_pattern: None,
                    description: Some(
                        "Top-level directory names of the Program Files folders".into(),
                    ),
                },
                teamviewer,
                collect_task(
                    "bet",
                    "BET_export",
                    "bet_files.csv",
                    vec![SourceSpec::labeled(r"C:\BET\Logs", "Logs")],
                    "Betting terminal logs from C:\\BET\\Logs",
                ),
                collect_task(
                    "browser_history",
                    "BrowserHistory_export",
                    "browser_history.csv",
                    vec![
                        SourceSpec::labeled(
                            r"%LOCALAPPDATA%\Microsoft\Edge\User Data\Default\History",
                            "Edge",
                        ),
                        SourceSpec::each_subdir(
                            r"%APPDATA%\Mozilla\Firefox\Profiles",
                            "places.sqlite",
                            "Firefox",
                        ),
                        SourceSpec::labeled(
                            r"%LOCALAPPDATA%\Google\Chrome\User Data\Default\History",
                            "Chrome",
                        ),
                    ],
                    "Edge, Firefox and Chrome history databases",
                ),
            ],
            global_options: HashMap::new(),
        }
    }

    /// Default configuration for Linux
    pub fn default_linux() -> Self {
        ExtractionConfig {
            version: "1.0".into(),
            description: "Default Linux live extraction configuration".into(),
            tasks: vec![
                dir_tree_task("/"),
                processes_task(),
                TaskDefinition {
                    id: "installed_programs".into(),
                    kind: TaskKind::StructureMirror,
                    output_name: "InstalledPrograms_export".into(),
                    manifest_name: None,
                    sources: vec![
                        SourceSpec::labeled("/opt", "opt"),
                        SourceSpec::labeled("/usr/share/applications", "applications"),
                    ],
                    include_pattern: None,
                    description: Some("Top-level entries of /opt and desktop entries".into()),
                },
                collect_task(
                    "browser_history",
                    "BrowserHistory_export",
                    "browser_history.csv",
                    vec![
                        SourceSpec::each_subdir("$HOME/.mozilla/firefox", "places.sqlite", "Firefox"),
                        SourceSpec::labeled("$HOME/.config/google-chrome/Default/History", "Chrome"),
                        SourceSpec::labeled("$HOME/.config/chromium/Default/History", "Chromium"),
                        SourceSpec::labeled(
                            "$HOME/.config/microsoft-edge/Default/History",
                            "Edge",
                        ),
                    ],
                    "Firefox, Chrome, Chromium and Edge history databases",
                ),
                collect_task(
                    "teamviewer",
                    "TeamViewer_export",
                    "teamviewer_files.csv",
                    vec![
                        SourceSpec::path("/opt/teamviewer/logfiles"),
                        SourceSpec::labeled("$HOME/.local/share/teamviewer15/logfiles", "user"),
                    ],
                    "TeamViewer log files",
                ),
                collect_task(
                    "system_logs",
                    "SystemLogs_export",
                    "system_log_files.csv",
                    vec![
                        SourceSpec::labeled("/var/log/auth.log", "var/log"),
                        SourceSpec::labeled("/var/log/syslog", "var/log"),
                        SourceSpec::labeled("$HOME/.bash_history", "home"),
                    ],
                    "Authentication log, syslog and shell history",
                ),
            ],
            global_options: HashMap::new(),
        }
    }

    /// Default configuration for macOS
    pub fn default_macos() -> Self {
        ExtractionConfig {
            version: "1.0".into(),
            description: "Default macOS live extraction configuration".into(),
            tasks: vec![
                dir_tree_task("/Users"),
                processes_task(),
                TaskDefinition {
                    id: "installed_programs".into(),
                    kind: TaskKind::StructureMirror,
                    output_name: "InstalledPrograms_export".into(),
                    manifest_name: None,
                    sources: vec![
                        SourceSpec::labeled("/Applications", "Applications"),
                        SourceSpec::labeled("$HOME/Applications", "UserApplications"),
                    ],
                    include_pattern: None,
                    description: Some("Names of installed application bundles".into()),
                },
                collect_task(
                    "browser_history",
                    "BrowserHistory_export",
                    "browser_history.csv",
                    vec![
                        SourceSpec::each_subdir(
                            "$HOME/Library/Application Support/Firefox/Profiles",
                            "places.sqlite",
                            "Firefox",
                        ),
                        SourceSpec::labeled(
                            "$HOME/Library/Application Support/Google/Chrome/Default/History",
                            "Chrome",
                        ),
                        SourceSpec::labeled("$HOME/Library/Safari/History.db", "Safari"),
                    ],
                    "Firefox, Chrome and Safari history databases",
                ),
                collect_task(
                    "teamviewer",
                    "TeamViewer_export",
                    "teamviewer_files.csv",
                    vec![SourceSpec::path("$HOME/Library/Logs/TeamViewer")],
                    "TeamViewer log files",
                ),
            ],
            global_options: HashMap::new(),
        }
    }

    /// Minimal configuration for other platforms
    pub fn default_minimal() -> Self {
        ExtractionConfig {
            version: "1.0".into(),
            description: "Minimal live extraction configuration".into(),
            tasks: vec![processes_task(), dir_tree_task("/")],
            global_options: HashMap::new(),
        }
    }
}
