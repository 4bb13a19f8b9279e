//! Turns configured source specifications into concrete source roots.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::collectors::collector::SourceRoot;
use crate::config::{expand_with, normalize_path_for_os, SourceSpec};

/// Resolve specs against the process environment
pub fn resolve_sources(specs: &[SourceSpec]) -> Vec<SourceRoot> {
    resolve_sources_with(specs, |name| std::env::var(name).ok())
}

/// Resolve specs with a caller-supplied environment lookup.
///
/// Plain paths resolve to exactly one root whether or not they exist, so
/// absence is reported by the collector. A per-subdirectory spec resolves to
/// one root per child directory that contains the named file.
pub fn resolve_sources_with<F>(specs: &[SourceSpec], lookup: F) -> Vec<SourceRoot>
where
    F: Fn(&str) -> Option<String>,
{
    let mut roots = Vec::new();

    for spec in specs {
        match spec {
            SourceSpec::Path { path, label } => {
                let path = expand_path(path, &lookup);
                debug!("Resolved source {}", path.display());
                roots.push(SourceRoot {
                    path,
                    label: label.clone(),
                });
            }
            SourceSpec::EachSubdir {
                each_subdir,
                file,
                label,
            } => {
                let parent = expand_path(each_subdir, &lookup);
                roots.extend(each_subdir_roots(&parent, file, label.as_deref()));
            }
        }
    }

    roots
}

fn expand_path<F>(raw: &str, lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    PathBuf::from(normalize_path_for_os(&expand_with(raw, lookup)))
}

fn each_subdir_roots(parent: &Path, file: &str, label: Option<&str>) -> Vec<SourceRoot> {
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Source not found: {} ({})", parent.display(), e);
            return Vec::new();
        }
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    children
        .into_iter()
        .filter_map(|child| {
            let candidate = child.join(file);
            if !candidate.exists() {
                debug!("No {} in {}", file, child.display());
                return None;
            }
            let child_name = child.file_name()?.to_string_lossy().to_string();
            let child_label = match label {
                Some(label) if !label.is_empty() => format!("{}/{}", label, child_name),
                _ => child_name,
            };
            Some(SourceRoot::labeled(candidate, child_label))
        })
        .collect()
}
