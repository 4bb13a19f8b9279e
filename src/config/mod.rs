// Re-export all items from the submodules
mod default_configs;
mod env_vars;
mod extraction_config;
mod task_types;

pub use extraction_config::{load_or_default, ExtractionConfig, TaskDefinition};

pub use task_types::{SourceSpec, TaskKind};

pub use env_vars::{expand_env_vars, expand_with, normalize_path_for_os};
