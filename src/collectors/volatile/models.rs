use serde::{Deserialize, Serialize};

/// Process information data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub cmd: Vec<String>,
    pub status: String,
    /// Resident memory in KiB
    pub memory_kib: u64,
}
