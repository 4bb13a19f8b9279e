use std::fmt;

use serde::{Deserialize, Serialize};

/// What a task does with its sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Copy, hash and record every file under the sources
    Collect,
    /// Write a text listing of the first source's subtree
    DirectoryTree,
    /// Write a snapshot of the running processes
    Processes,
    /// Recreate the top-level directory names of each source, without content
    StructureMirror,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Collect => "collect",
            TaskKind::DirectoryTree => "directory tree",
            TaskKind::Processes => "processes",
            TaskKind::StructureMirror => "structure mirror",
        };
        write!(f, "{}", name)
    }
}

/// A configured source location, before environment expansion.
///
/// ```yaml
/// - path: '%WINDIR%\Prefetch'
///   label: Windows/Prefetch
/// - each_subdir: '%APPDATA%\Mozilla\Firefox\Profiles'
///   file: places.sqlite
///   label: Firefox
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    /// `file` inside every child directory of `each_subdir`; each match is
    /// labeled `<label>/<child name>`
    EachSubdir {
        each_subdir: String,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// A single file or directory
    Path {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl SourceSpec {
    pub fn path(path: impl Into<String>) -> Self {
        SourceSpec::Path {
            path: path.into(),
            label: None,
        }
    }

    pub fn labeled(path: impl Into<String>, label: impl Into<String>) -> Self {
        SourceSpec::Path {
            path: path.into(),
            label: Some(label.into()),
        }
    }

    pub fn each_subdir(
        parent: impl Into<String>,
        file: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        SourceSpec::EachSubdir {
            each_subdir: parent.into(),
            file: file.into(),
            label: Some(label.into()),
        }
    }
}
