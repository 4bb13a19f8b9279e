use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::collectors::fault_tracker::FaultTracker;
use crate::collectors::progress::{self, ProgressObserver};
use crate::models::{Digest, FaultKind, FileRecord};
use crate::utils::hash::calculate_sha256;
use crate::utils::manifest::ManifestWriter;

/// A location to collect from.
///
/// Files found under `path` land under `destination_root/label/<relative path>`,
/// or directly under `destination_root` when there is no label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub label: Option<String>,
}

impl SourceRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceRoot {
            path: path.into(),
            label: None,
        }
    }

    pub fn labeled(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        SourceRoot {
            path: path.into(),
            label: Some(label.into()),
        }
    }

    /// Directory that mirrors this root inside `destination_root`.
    ///
    /// Labels use `/` between components on every platform.
    pub fn destination_base(&self, destination_root: &Path) -> PathBuf {
        let label = self.label.as_deref().unwrap_or_default();
        label
            .split(['/', '\\'])
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .fold(destination_root.to_path_buf(), |base, part| base.join(part))
    }
}

/// One unit of collection work: where to read, where to write, where to log.
#[derive(Debug, Clone)]
pub struct CollectionTask {
    pub source_roots: Vec<SourceRoot>,
    pub destination_root: PathBuf,
    pub manifest_path: PathBuf,
}

/// Counters describing a finished collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Files processed, i.e. manifest rows written
    pub files: u64,
    pub copy_failures: u64,
    pub digest_failures: u64,
    pub unreadable_entries: u64,
    pub missing_roots: u64,
    pub skipped_entries: u64,
}

/// Shared collection routine used by every file-based artifact task.
///
/// For each regular file under the source roots it copies the file with its
/// timestamps, hashes the source and appends one manifest row. Per-entry
/// faults are logged and recorded; only destination or manifest failures
/// abort the collection.
pub struct Collector<'a> {
    task_id: String,
    include: Option<Regex>,
    faults: FaultTracker,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> Collector<'a> {
    pub fn new(task_id: impl Into<String>) -> Self {
        Collector {
            task_id: task_id.into(),
            include: None,
            faults: FaultTracker::new(),
            observer: None,
        }
    }

    /// Only collect files whose name matches `pattern`
    pub fn with_include_pattern(mut self, pattern: &str) -> Result<Self> {
        self.include = Some(Regex::new(pattern).context("Invalid include pattern regex")?);
        Ok(self)
    }

    /// Record faults into a run-wide tracker instead of a private one
    pub fn with_fault_tracker(mut self, faults: FaultTracker) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn faults(&self) -> &FaultTracker {
        &self.faults
    }

    /// Run a whole task: create the destination, open the manifest, collect, close.
    pub fn run(&self, task: &CollectionTask) -> Result<CollectionStats> {
        fs::create_dir_all(&task.destination_root).context(format!(
            "Failed to create destination root {}",
            task.destination_root.display()
        ))?;

        let mut manifest = ManifestWriter::create(&task.manifest_path)?;
        let stats = self.collect(&task.source_roots, &task.destination_root, &mut manifest)?;
        manifest.finish()?;

        Ok(stats)
    }

    /// Collect every regular file under `source_roots` into `destination_root`.
    pub fn collect(
        &self,
        source_roots: &[SourceRoot],
        destination_root: &Path,
        manifest: &mut ManifestWriter,
    ) -> Result<CollectionStats> {
        fs::create_dir_all(destination_root).context(format!(
            "Failed to create destination root {}",
            destination_root.display()
        ))?;

        let mut walk = Walk::new(destination_root, manifest.path());

        for root in source_roots {
            self.collect_root(root, destination_root, manifest, &mut walk)?;
        }

        info!(
            "[{}] collected {} files ({} copy failures, {} hash failures, {} unreadable entries)",
            self.task_id,
            walk.stats.files,
            walk.stats.copy_failures,
            walk.stats.digest_failures,
            walk.stats.unreadable_entries
        );
        Ok(walk.stats)
    }

    fn collect_root(
        &self,
        root: &SourceRoot,
        destination_root: &Path,
        manifest: &mut ManifestWriter,
        walk: &mut Walk,
    ) -> Result<()> {
        let base = root.destination_base(destination_root);

        let root_metadata = match fs::metadata(&root.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("[{}] Source not found: {}", self.task_id, root.path.display());
                walk.stats.missing_roots += 1;
                return Ok(());
            }
            Err(e) => {
                self.record_fault(&root.path, &e, "Cannot access source root");
                walk.stats.unreadable_entries += 1;
                return Ok(());
            }
        };

        if walk.overlaps_destination(&root.path) {
            let e = io::Error::new(
                io::ErrorKind::InvalidInput,
                "source lies inside the destination or is the manifest",
            );
            self.record_fault(&root.path, &e, "Refusing to collect");
            walk.stats.skipped_entries += 1;
            return Ok(());
        }

        if root_metadata.is_file() {
            let file_name = root
                .path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("unnamed"));
            return self.collect_file(&root.path, &base.join(file_name), manifest, walk);
        }

        debug!("[{}] Walking {}", self.task_id, root.path.display());

        // Our own destination tree and manifest when they sit below this root
        let own_outputs = walk.outputs_within(&root.path);
        let walker = WalkDir::new(&root.path)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let own = own_outputs.iter().any(|p| p == entry.path());
                if own {
                    debug!("[{}] Not descending into output {}", self.task_id, entry.path().display());
                }
                !own
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(&root.path).to_path_buf();
                    let io_error = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                    self.record_fault(&path, &io_error, "Cannot read entry");
                    walk.stats.unreadable_entries += 1;
                    continue;
                }
            };

            let path = entry.path();
            let relative = path.strip_prefix(&root.path).unwrap_or(path);
            let destination = base.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let Err(e) = fs::create_dir_all(&destination) {
                    warn!("[{}] Failed to create {}: {}", self.task_id, destination.display(), e);
                }
                walk.tick(self.observer);
            } else if file_type.is_file() {
                if self.is_included(path) {
                    self.collect_file(path, &destination, manifest, walk)?;
                } else {
                    walk.tick(self.observer);
                }
            } else {
                debug!("[{}] Skipping non-regular entry {}", self.task_id, path.display());
                walk.stats.skipped_entries += 1;
                walk.tick(self.observer);
            }
        }

        Ok(())
    }

    fn is_included(&self, path: &Path) -> bool {
        match (&self.include, path.file_name()) {
            (None, _) => true,
            (Some(regex), Some(name)) => regex.is_match(&name.to_string_lossy()),
            (Some(_), None) => false,
        }
    }

    /// Copy one file, hash its source and append its manifest row.
    ///
    /// Only a manifest write failure is returned as an error.
    fn collect_file(
        &self,
        source: &Path,
        destination: &Path,
        manifest: &mut ManifestWriter,
        walk: &mut Walk,
    ) -> Result<()> {
        // Source timestamps are read before the copy touches them
        let metadata = match fs::metadata(source) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!("[{}] No metadata for {}: {}", self.task_id, source.display(), e);
                None
            }
        };

        let copied = if walk.is_manifest(destination) {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination {} is the task manifest", destination.display()),
            ))
        } else {
            copy_preserving_times(source, destination, metadata.as_ref())
        };

        let digest = match copied {
            Ok(()) => {
                debug!("[{}] Copied {} to {}", self.task_id, source.display(), destination.display());
                match calculate_sha256(source) {
                    Ok(hex) => Digest::Hex(hex),
                    Err(e) => {
                        self.record_fault(source, &e, "Failed to hash");
                        walk.stats.digest_failures += 1;
                        Digest::Unavailable
                    }
                }
            }
            Err(e) => {
                self.record_fault(source, &e, "Failed to copy");
                walk.stats.copy_failures += 1;
                Digest::Unavailable
            }
        };

        let record = FileRecord::from_source(source, metadata.as_ref(), digest);
        manifest.append(&record)?;
        walk.stats.files += 1;
        walk.tick(self.observer);

        Ok(())
    }

    fn record_fault(&self, path: &Path, error: &io::Error, action: &str) {
        let kind = FaultKind::from_io(error);
        warn!("[{}] {} {}: {}", self.task_id, action, path.display(), error);
        self.faults
            .record(&self.task_id, path, kind, format!("{}: {}", action, error));
    }
}

/// Per-collection walk state, including where the collector itself writes
struct Walk {
    stats: CollectionStats,
    processed: u64,
    manifest_path: PathBuf,
    canonical_manifest: Option<PathBuf>,
    canonical_destination: Option<PathBuf>,
}

impl Walk {
    fn new(destination_root: &Path, manifest_path: &Path) -> Self {
        Walk {
            stats: CollectionStats::default(),
            processed: 0,
            manifest_path: manifest_path.to_path_buf(),
            canonical_manifest: fs::canonicalize(manifest_path).ok(),
            canonical_destination: fs::canonicalize(destination_root).ok(),
        }
    }

    fn own_outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.canonical_destination
            .iter()
            .chain(self.canonical_manifest.iter())
    }

    /// Outputs below `root`, spelled the way a walk of `root` yields them
    fn outputs_within(&self, root: &Path) -> Vec<PathBuf> {
        let Ok(canonical_root) = fs::canonicalize(root) else {
            return Vec::new();
        };
        self.own_outputs()
            .filter_map(|output| output.strip_prefix(&canonical_root).ok())
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(|relative| root.join(relative))
            .collect()
    }

    /// Whether `root` is the destination, lies inside it, or is the manifest
    fn overlaps_destination(&self, root: &Path) -> bool {
        let Ok(canonical_root) = fs::canonicalize(root) else {
            return false;
        };
        self.canonical_destination
            .as_ref()
            .map_or(false, |dest| canonical_root.starts_with(dest))
            || self.canonical_manifest.as_ref() == Some(&canonical_root)
    }

    /// Whether copying to `destination` would overwrite the open manifest
    fn is_manifest(&self, destination: &Path) -> bool {
        if destination == self.manifest_path {
            return true;
        }
        destination.file_name() == self.manifest_path.file_name()
            && self.canonical_manifest.is_some()
            && fs::canonicalize(destination).ok() == self.canonical_manifest
    }

    fn tick(&mut self, observer: Option<&dyn ProgressObserver>) {
        self.processed += 1;
        progress::notify(observer, self.processed);
    }
}

/// Copy `source` to `destination`, creating parent directories, then carry
/// over the source's timestamps on a best-effort basis.
pub fn copy_preserving_times(
    source: &Path,
    destination: &Path,
    source_metadata: Option<&Metadata>,
) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::copy(source, destination)?;

    if let Some(metadata) = source_metadata {
        if let Err(e) = apply_source_times(destination, metadata) {
            debug!("Could not preserve timestamps on {}: {}", destination.display(), e);
        }
    }

    Ok(())
}

fn apply_source_times(destination: &Path, source: &Metadata) -> io::Result<()> {
    let mut times = fs::FileTimes::new();
    if let Ok(accessed) = source.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = source.modified() {
        times = times.set_modified(modified);
    }

    #[cfg(windows)]
    {
        use std::os::windows::fs::FileTimesExt;
        if let Ok(created) = source.created() {
            times = times.set_created(created);
        }
    }

    // Read-only copies cannot be opened for writing; a read handle is enough on Unix
    let file = fs::OpenOptions::new()
        .write(true)
        .open(destination)
        .or_else(|_| fs::File::open(destination))?;
    file.set_times(times)
}
