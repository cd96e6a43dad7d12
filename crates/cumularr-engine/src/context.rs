//! Shared dependencies handed to every orchestration worker and watcher.

use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use cumularr_core::{CloudClient, DownloadTask, TransferEvent};
use tokio_util::sync::CancellationToken;

use crate::plan::TargetPlanner;
use crate::probe::ImportProbe;
use crate::tracker::WatcherPool;

/// Dependencies shared by orchestration workers, watchers and the
/// reconciler. Cloned by reference through one `Arc`.
pub(crate) struct WorkerContext {
    /// Remote cloud service handle.
    pub(crate) cloud: Arc<dyn CloudClient>,
    /// Plan builder for newly discovered transfers.
    pub(crate) planner: TargetPlanner,
    /// Import-history probe over the configured Arr services.
    pub(crate) probe: ImportProbe,
    /// Tracker for spawned watchers.
    pub(crate) watchers: Arc<WatcherPool>,
    /// Producer side of the `transfer-events` channel.
    pub(crate) events_tx: Sender<TransferEvent>,
    /// Producer side of the `download-tasks` channel.
    pub(crate) tasks_tx: Sender<DownloadTask>,
    /// Cadence shared by the poller and both watcher kinds.
    pub(crate) poll_interval: Duration,
    /// Root cancellation token.
    pub(crate) cancel: CancellationToken,
}

/// Sleep one period, returning `true` when the root token was cancelled
/// instead.
pub(crate) async fn idle(cancel: &CancellationToken, period: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => true,
        () = tokio::time::sleep(period) => false,
    }
}
