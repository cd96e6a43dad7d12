//! Download-plan instructions and the tasks that carry them to the fetch
//! worker pool.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use tokio::sync::oneshot;

/// Discriminates the two kinds of plan instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Create a local directory.
    Directory,
    /// Stream a remote file to a local path.
    File,
}

/// One instruction in a transfer's download plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Absolute local destination path.
    pub to: PathBuf,
    /// Source HTTP URL; empty exactly when `kind` is `Directory`.
    pub from: String,
    /// Instruction kind.
    pub kind: TargetKind,
    /// Whether this target is the transfer's root on local disk. Exactly
    /// one target per non-empty plan carries this flag.
    pub top_level: bool,
    /// Owning transfer's infohash, for log correlation.
    pub transfer_hash: String,
}

impl DownloadTarget {
    /// Whether this is a file-fetch instruction.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, TargetKind::File)
    }
}

impl Display for DownloadTarget {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} [{}]", self.to.display(), self.transfer_hash)
    }
}

/// Terminal outcome of a fetch task, reported back over the task's promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Target materialized on disk.
    Success,
    /// Fetch failed; the error was logged by the fetch worker.
    Failed,
}

impl FetchOutcome {
    /// Whether the fetch succeeded.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A unit of work on the `download-tasks` channel: the target to fetch and
/// the promise the submitting orchestration worker awaits.
#[derive(Debug)]
pub struct DownloadTask {
    /// Target to materialize.
    pub target: DownloadTarget,
    /// Completion promise resolved by the fetch worker.
    pub done: oneshot::Sender<FetchOutcome>,
}
