//! Text rendering of a directory subtree.
//!
//! The listing uses the familiar `tree` glyphs. Directories that cannot be
//! listed produce a single bracketed fault line at their position and the
//! walk carries on with the next sibling.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::collectors::fault_tracker::FaultTracker;
use crate::collectors::progress::{self, ProgressObserver};
use crate::constants::{
    TREE_BRANCH, TREE_FAULT_NOT_FOUND, TREE_FAULT_PERMISSION_DENIED, TREE_FAULT_UNREADABLE,
    TREE_LAST_BRANCH, TREE_PIPE_PREFIX, TREE_SPACE_PREFIX,
};
use crate::models::FaultKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Lines written for entries (fault lines excluded)
    pub entries: u64,
    pub directories: u64,
    pub faults: u64,
}

pub struct TreeRenderer<'a> {
    task_id: String,
    faults: FaultTracker,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(task_id: impl Into<String>) -> Self {
        TreeRenderer {
            task_id: task_id.into(),
            faults: FaultTracker::new(),
            observer: None,
        }
    }

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

    /// Render the tree under `root` into `out`. The root itself is not printed.
    ///
    /// Only a failure to write to `out` is returned as an error.
    pub fn render<W: Write>(&self, root: &Path, out: &mut W) -> Result<TreeStats> {
        info!("[{}] Generating directory tree from {}", self.task_id, root.display());

        let mut stats = TreeStats::default();
        self.render_dir(root, "", out, &mut stats)
            .context("Failed to write directory tree")?;

        info!(
            "[{}] Directory tree complete: {} entries, {} directories, {} faults",
            self.task_id, stats.entries, stats.directories, stats.faults
        );
        Ok(stats)
    }

    /// Render the tree under `root` into a UTF-8 text file at `output`.
    pub fn render_to_file(&self, root: &Path, output: &Path) -> Result<TreeStats> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create directory {}", parent.display()))?;
        }

        let file = File::create(output)
            .context(format!("Failed to create tree listing {}", output.display()))?;
        let mut writer = BufWriter::new(file);

        let stats = self.render(root, &mut writer)?;
        writer
            .flush()
            .context(format!("Failed to flush tree listing {}", output.display()))?;

        info!("[{}] Directory tree saved to {}", self.task_id, output.display());
        Ok(stats)
    }

    fn render_dir<W: Write>(
        &self,
        dir: &Path,
        prefix: &str,
        out: &mut W,
        stats: &mut TreeStats,
    ) -> io::Result<()> {
        let children = match sorted_children(dir) {
            Ok(children) => children,
            Err(e) => {
                let kind = FaultKind::from_io(&e);
                warn!("[{}] Cannot list {}: {}", self.task_id, dir.display(), e);
                self.faults
                    .record(&self.task_id, dir, kind, format!("Cannot list directory: {}", e));
                stats.faults += 1;
                return writeln!(out, "{}{}{}", prefix, TREE_SPACE_PREFIX, fault_label(kind));
            }
        };

        let count = children.len();
        for (index, (name, path, is_dir)) in children.into_iter().enumerate() {
            let last = index + 1 == count;
            let connector = if last { TREE_LAST_BRANCH } else { TREE_BRANCH };
            writeln!(out, "{}{}{}", prefix, connector, name.to_string_lossy())?;
            stats.entries += 1;

            if is_dir {
                stats.directories += 1;
                let extension = if last { TREE_SPACE_PREFIX } else { TREE_PIPE_PREFIX };
                let child_prefix = format!("{}{}", prefix, extension);
                self.render_dir(&path, &child_prefix, out, stats)?;
            }

            progress::notify(self.observer, stats.entries);
        }

        Ok(())
    }
}

/// Directory children sorted by name, with whether each is a real directory.
///
/// Symbolic links are reported as plain entries and never descended into.
fn sorted_children(dir: &Path) -> io::Result<Vec<(OsString, PathBuf, bool)>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        match entry {
            Ok(entry) => {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                children.push((entry.file_name(), entry.path(), is_dir));
            }
            Err(e) => debug!("Skipping unreadable entry in {}: {}", dir.display(), e),
        }
    }
    children.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(children)
}

fn fault_label(kind: FaultKind) -> &'static str {
    match kind {
        FaultKind::PermissionDenied => TREE_FAULT_PERMISSION_DENIED,
        FaultKind::NotFound => TREE_FAULT_NOT_FOUND,
        FaultKind::Other => TREE_FAULT_UNREADABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::progress::MockProgressObserver;
    use tempfile::TempDir;

    fn render_string(root: &Path) -> (String, TreeStats) {
        let mut out = Vec::new();
        let stats = TreeRenderer::new("dir_tree").render(root, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_render_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("b_dir/inner")).unwrap();
        fs::write(root.join("a.txt"), b"").unwrap();
        fs::write(root.join("b_dir/inner/deep.txt"), b"").unwrap();
        fs::write(root.join("b_dir/z.txt"), b"").unwrap();
        fs::write(root.join("c.txt"), b"").unwrap();

        let (listing, stats) = render_string(root);

        let expected = "\
├── a.txt
├── b_dir
│   ├── inner
│   │   └── deep.txt
│   └── z.txt
└── c.txt
";
        assert_eq!(listing, expected);
        assert_eq!(stats.entries, 6);
        assert_eq!(stats.directories, 2);
        assert_eq!(stats.faults, 0);
    }

    #[test]
    fn test_render_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "Mid", "beta"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
            fs::write(temp_dir.path().join(name).join("f"), b"x").unwrap();
        }

        let (first, _) = render_string(temp_dir.path());
        let (second, _) = render_string(temp_dir.path());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_emits_fault_line() {
        let temp_dir = TempDir::new().unwrap();
        let renderer = TreeRenderer::new("dir_tree");
        let mut out = Vec::new();
        let stats = renderer
            .render(&temp_dir.path().join("gone"), &mut out)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "    [File Not Found]\n");
        assert_eq!(stats.faults, 1);
        assert_eq!(renderer.faults().total(), 1);
    }

    #[test]
    fn test_render_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("only.txt"), b"").unwrap();

        let output = temp_dir.path().join("DirTree_export").join("dir_tree.txt");
        TreeRenderer::new("dir_tree").render_to_file(&root, &output).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "└── only.txt\n");
    }

    #[test]
    fn test_observer_called_per_entry() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one"), b"").unwrap();
        fs::write(temp_dir.path().join("two"), b"").unwrap();

        let mut observer = MockProgressObserver::new();
        observer.expect_on_entry().times(2).return_const(());

        let mut out = Vec::new();
        TreeRenderer::new("dir_tree")
            .with_observer(&observer)
            .render(temp_dir.path(), &mut out)
            .unwrap();
    }

    #[test]
    fn test_directory_vanishing_mid_render_emits_sentinel() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("a_dir")).unwrap();
        fs::write(root.join("a_dir/one.log"), b"").unwrap();
        fs::create_dir(root.join("b_dir")).unwrap();
        fs::write(root.join("b_dir/two.log"), b"").unwrap();
        fs::write(root.join("c.log"), b"").unwrap();

        // The root listing is already taken when the first entry is reported
        let victim = root.join("b_dir");
        let mut observer = MockProgressObserver::new();
        observer.expect_on_entry().returning(move |_| {
            let _ = fs::remove_dir_all(&victim);
        });

        let renderer = TreeRenderer::new("dir_tree").with_observer(&observer);
        let mut out = Vec::new();
        let stats = renderer.render(root, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "├── a_dir\n│   └── one.log\n├── b_dir\n│       [File Not Found]\n└── c.log\n"
        );
        assert_eq!(stats.faults, 1);
        assert_eq!(renderer.faults().total(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_emits_sentinel() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("locked")).unwrap();
        fs::write(root.join("locked/hidden.txt"), b"").unwrap();
        fs::write(root.join("open.txt"), b"").unwrap();
        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(root.join("locked")).is_ok() {
            fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();
            eprintln!("skipped: mode 000 is not enforced for this user");
            return;
        }

        let (listing, stats) = render_string(root);
        fs::set_permissions(root.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(listing, "├── locked\n│       [Permission Denied]\n└── open.txt\n");
        assert_eq!(stats.faults, 1);
    }
}
