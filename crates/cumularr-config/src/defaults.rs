//! Default values for optional configuration keys.

use std::time::Duration;

/// Default poller/watcher cadence.
pub(crate) const fn polling_interval() -> Duration {
    Duration::from_secs(10)
}

/// Default orchestration worker count.
pub(crate) const fn orchestration_workers() -> usize {
    10
}

/// Default file-fetch worker count.
pub(crate) const fn download_workers() -> usize {
    4
}

/// Folder names elided from plans unless overridden.
pub(crate) fn skip_directories() -> Vec<String> {
    vec!["sample".to_string(), "extras".to_string()]
}
