use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::task_types::{SourceSpec, TaskKind};

/// One selectable extraction module
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskDefinition {
    /// Identifier used on the command line (`--modules prefetch,bet`)
    pub id: String,
    pub kind: TaskKind,
    /// Working directory name; also names the archive (`Prefetch_export.zip`)
    pub output_name: String,
    /// Manifest file name inside the working directory, for `Collect` tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_name: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    /// Regular expression a file name must match to be collected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskDefinition {
    /// Manifest file name, derived from the id when not configured
    pub fn manifest_file_name(&self) -> String {
        self.manifest_name
            .clone()
            .unwrap_or_else(|| format!("{}_files.csv", self.id))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub version: String,
    pub description: String,
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub global_options: HashMap<String, String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::default_for_os(std::env::consts::OS)
    }
}

impl ExtractionConfig {
    pub fn default_for_os(target_os: &str) -> Self {
        match target_os {
            "windows" => Self::default_windows(),
            "linux" => Self::default_linux(),
            "macos" => Self::default_macos(),
            _ => Self::default_minimal(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: ExtractionConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
        config.validate()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, yaml).context(format!("Failed to write config to {}", path.display()))?;

        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Reject duplicate ids, duplicate output directories and bad patterns
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashMap::new();
        let mut outputs = HashMap::new();

        for task in &self.tasks {
            if task.id.trim().is_empty() {
                bail!("Task with empty id in configuration");
            }
            if let Some(previous) = ids.insert(task.id.as_str(), task) {
                bail!("Duplicate task id '{}'", previous.id);
            }
            if let Some(previous) = outputs.insert(task.output_name.as_str(), task) {
                bail!(
                    "Tasks '{}' and '{}' share output directory '{}'",
                    previous.id,
                    task.id,
                    task.output_name
                );
            }
            if let Some(pattern) = &task.include_pattern {
                regex::Regex::new(pattern)
                    .context(format!("Invalid include_pattern for task '{}'", task.id))?;
            }
        }

        Ok(())
    }

    pub fn task(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks named in `selection`, in selection order; all tasks when empty
    pub fn select(&self, selection: &[String]) -> Result<Vec<TaskDefinition>> {
        if selection.is_empty() {
            return Ok(self.tasks.clone());
        }

        let mut selected: Vec<TaskDefinition> = Vec::new();
        for id in selection {
            let task = self.task(id).ok_or_else(|| {
                let known: Vec<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
                anyhow::anyhow!("Unknown module '{}'. Available: {}", id, known.join(", "))
            })?;
            if !selected.iter().any(|t| t.id == task.id) {
                selected.push(task.clone());
            }
        }
        Ok(selected)
    }

    /// Write the default configuration for `target_os` to `path`
    pub fn create_os_specific_config_file(path: &Path, target_os: &str) -> Result<()> {
        Self::default_for_os(target_os).save_to_yaml_file(path)
    }
}

/// Load a configuration file, or the built-in default for this OS.
///
/// An explicit path that does not exist is an error.
pub fn load_or_default(config_path: Option<&Path>) -> Result<ExtractionConfig> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            ExtractionConfig::from_yaml_file(path)
        }
        None => {
            info!("Using built-in configuration for {}", std::env::consts::OS);
            Ok(ExtractionConfig::default())
        }
    }
}
