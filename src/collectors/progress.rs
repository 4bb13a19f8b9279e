//! Optional progress reporting for long traversals.

use log::info;

use crate::constants::PROGRESS_LOG_INTERVAL;

/// Receives the running count of processed entries.
///
/// Observers are a side channel only: they cannot influence the traversal.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressObserver: Send + Sync {
    fn on_entry(&self, processed: u64);
}

/// Logs a progress line every `interval` entries
pub struct LogProgress {
    label: String,
    interval: u64,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_interval(label, PROGRESS_LOG_INTERVAL)
    }

    pub fn with_interval(label: impl Into<String>, interval: u64) -> Self {
        LogProgress {
            label: label.into(),
            interval: interval.max(1),
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_entry(&self, processed: u64) {
        if processed % self.interval == 0 {
            info!("{}: processed {} entries", self.label, processed);
        }
    }
}

/// Notify an observer if one is attached
pub(crate) fn notify(observer: Option<&dyn ProgressObserver>, processed: u64) {
    if let Some(observer) = observer {
        observer.on_entry(processed);
    }
}
