//! Process-local mirror of a remote transfer and the events that drive it
//! through the download lifecycle.

use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::error;

use crate::remote::RemoteTransfer;
use crate::target::DownloadTarget;

/// Display fallback used when the remote side reports no infohash.
const UNKNOWN_HASH: &str = "0000";

/// Display fallback used when the remote side reports no name.
const UNKNOWN_NAME: &str = "Unknown";

/// Remote transfer lifecycle states, parsed case-insensitively from the
/// wire status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Transfer is stopped.
    Stopped,
    /// Remote download finished.
    Completed,
    /// Remote side reported a failure.
    Error,
    /// Waiting for a hash check slot.
    CheckWait,
    /// Remote side is preparing the payload for download.
    PreparingDownload,
    /// Hash check in progress.
    Check,
    /// Finalizing the remote download.
    Completing,
    /// Queued on the remote side.
    Queued,
    /// Waiting in the remote queue.
    InQueue,
    /// Actively downloading on the remote side.
    Downloading,
    /// Waiting for a seeding slot.
    SeedingWait,
    /// Actively seeding.
    Seeding,
    /// Any status string this build does not recognize.
    Unknown,
}

impl TransferStatus {
    /// Parse a wire status string. Comparison is case-insensitive and
    /// unrecognized values map to [`TransferStatus::Unknown`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "STOPPED" => Self::Stopped,
            "COMPLETED" => Self::Completed,
            "ERROR" => Self::Error,
            "CHECKWAIT" => Self::CheckWait,
            "PREPARING_DOWNLOAD" => Self::PreparingDownload,
            "CHECK" => Self::Check,
            "COMPLETING" => Self::Completing,
            "QUEUED" => Self::Queued,
            "IN_QUEUE" => Self::InQueue,
            "DOWNLOADING" => Self::Downloading,
            "SEEDINGWAIT" => Self::SeedingWait,
            "SEEDING" => Self::Seeding,
            _ => Self::Unknown,
        }
    }

    /// Whether the remote side is still seeding the payload.
    #[must_use]
    pub const fn is_seeding(self) -> bool {
        matches!(self, Self::Seeding)
    }
}

/// Process-local mirror of a remote transfer.
///
/// Instances are shared as `Arc<Transfer>` between the orchestration worker
/// that plans and downloads and the watchers that confirm import and
/// seeding. The target plan is the only mutable field and is set exactly
/// once, by the orchestration worker, after all downloads succeed.
#[derive(Debug)]
pub struct Transfer {
    /// Remote transfer identifier.
    pub transfer_id: u64,
    /// Human-readable label; `"Unknown"` when the remote side has none.
    pub name: String,
    /// Root of the remote file tree; `None` means not yet downloadable.
    pub file_id: Option<i64>,
    /// BitTorrent infohash, when known.
    pub hash: Option<String>,
    /// Remote folder the transfer was saved under.
    pub save_parent_id: Option<i64>,
    /// Total payload size in bytes, as last reported.
    pub size: Option<i64>,
    /// Bytes downloaded remotely, as last reported.
    pub downloaded: Option<i64>,
    /// Remote ETA in seconds, as last reported.
    pub estimated_time: Option<i64>,
    targets: Mutex<Option<Vec<DownloadTarget>>>,
}

impl Transfer {
    /// Mirror a remote listing record.
    #[must_use]
    pub fn from_remote(remote: &RemoteTransfer) -> Self {
        Self {
            transfer_id: remote.id,
            name: remote
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            file_id: remote.file_id,
            hash: remote.hash.clone(),
            save_parent_id: remote.save_parent_id,
            size: remote.size,
            downloaded: remote.downloaded,
            estimated_time: remote.estimated_time,
            targets: Mutex::new(None),
        }
    }

    /// Infohash for log correlation; `"0000"` when the remote side has none.
    #[must_use]
    pub fn display_hash(&self) -> &str {
        self.hash.as_deref().unwrap_or(UNKNOWN_HASH)
    }

    /// Whether the remote file tree exists and can be planned.
    #[must_use]
    pub const fn is_downloadable(&self) -> bool {
        self.file_id.is_some()
    }

    /// Bytes the remote side still has to download, clamped at zero when
    /// the reported progress overshoots the reported size.
    #[must_use]
    pub fn left_until_done(&self) -> i64 {
        let size = self.size.unwrap_or(0);
        let downloaded = self.downloaded.unwrap_or(0);
        (size - downloaded).max(0)
    }

    /// Remote completion ratio in `[0.0, 1.0]`.
    #[must_use]
    pub fn percent_done(&self) -> f64 {
        let size = self.size.unwrap_or(0);
        if size <= 0 {
            return 0.0;
        }
        let done = self.downloaded.unwrap_or(0).clamp(0, size);
        #[allow(clippy::cast_precision_loss)]
        {
            done as f64 / size as f64
        }
    }

    /// Persist the computed download plan. Called exactly once per
    /// transfer, by the orchestration worker, after all targets fetched.
    pub fn set_targets(&self, targets: Vec<DownloadTarget>) {
        *self.lock_targets() = Some(targets);
    }

    /// Snapshot of the download plan, when one has been set.
    #[must_use]
    pub fn targets(&self) -> Option<Vec<DownloadTarget>> {
        self.lock_targets().clone()
    }

    /// The single target marking the transfer's root on local disk.
    #[must_use]
    pub fn top_level_target(&self) -> Option<DownloadTarget> {
        self.lock_targets()
            .as_ref()
            .and_then(|targets| targets.iter().find(|target| target.top_level).cloned())
    }

    fn lock_targets(&self) -> MutexGuard<'_, Option<Vec<DownloadTarget>>> {
        match self.targets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!(
                    transfer_id = self.transfer_id,
                    "transfer target mutex poisoned; continuing with recovered guard"
                );
                poisoned.into_inner()
            }
        }
    }
}

impl Display for Transfer {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.transfer_id)
    }
}

/// Lifecycle events carried on the `transfer-events` channel.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// A new downloadable transfer was discovered and claimed.
    QueuedForDownload(Arc<Transfer>),
    /// Every target in the transfer's plan fetched successfully.
    Downloaded(Arc<Transfer>),
    /// Every file target was confirmed imported by an Arr service.
    Imported(Arc<Transfer>),
}

impl TransferEvent {
    /// The transfer the event refers to.
    #[must_use]
    pub const fn transfer(&self) -> &Arc<Transfer> {
        match self {
            Self::QueuedForDownload(transfer)
            | Self::Downloaded(transfer)
            | Self::Imported(transfer) => transfer,
        }
    }
}
