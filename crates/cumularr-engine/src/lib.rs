#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! The download-orchestration engine.
//!
//! The engine observes remote transfers, materializes them into local
//! download plans, fetches files through a bounded worker pool, waits for
//! Arr-side import confirmation, and cleans up both local disk and the
//! remote account once seeding stops. All state is in memory; a restart is
//! a full rediscovery from the remote service, driven by the startup
//! reconciler and the poller.
//!
//! Data flow: the poller produces `QueuedForDownload` events into the
//! bounded `transfer-events` channel; orchestration workers consume them,
//! plan targets and push `download-tasks` to the fetch pool; completed
//! downloads re-enter as `Downloaded`, which spawns an import watcher;
//! confirmed imports re-enter as `Imported`, which spawns a seed watcher.

mod context;
mod error;
mod fetch_pool;
mod plan;
mod poll;
mod probe;
mod reconcile;
mod seen;
#[cfg(test)]
mod testing;
mod tracker;
mod watch;
mod worker;

pub use error::{EngineError, EngineResult};
pub use plan::TargetPlanner;
pub use seen::SeenTransfers;
pub use tracker::WatcherPool;

use std::sync::Arc;

use cumularr_config::Config;
use cumularr_core::{CloudClient, ImportHistory, TargetFetcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::context::WorkerContext;
use crate::poll::Poller;
use crate::probe::ImportProbe;
use crate::reconcile::Reconciler;
use crate::worker::OrchestrationWorker;

/// Capacity of the `transfer-events` and `download-tasks` channels. A full
/// channel blocks its producer, which is the engine's backpressure.
const CHANNEL_CAPACITY: usize = 100;

/// Handle to a running engine.
pub struct Engine {
    poller: JoinHandle<()>,
    orchestration: Vec<JoinHandle<()>>,
    fetch_workers: Vec<JoinHandle<()>>,
    watchers: Arc<WatcherPool>,
}

impl Engine {
    /// Reconcile existing remote transfers and start the engine's task
    /// fleet: the poller, `orchestration_workers` event consumers and
    /// `download_workers` fetch workers.
    ///
    /// Reconciliation runs to completion before the poller starts, so a
    /// transfer that was imported in a previous life of this process is
    /// adopted instead of re-downloaded.
    pub async fn start(
        config: &Config,
        cloud: Arc<dyn CloudClient>,
        history: Vec<Arc<dyn ImportHistory>>,
        fetcher: Arc<dyn TargetFetcher>,
        cancel: CancellationToken,
    ) -> Self {
        let (events_tx, events_rx) = async_channel::bounded(CHANNEL_CAPACITY);
        let (tasks_tx, tasks_rx) = async_channel::bounded(CHANNEL_CAPACITY);
        let seen = Arc::new(SeenTransfers::new());
        let watchers = Arc::new(WatcherPool::new());

        let ctx = Arc::new(WorkerContext {
            cloud: Arc::clone(&cloud),
            planner: TargetPlanner::new(
                Arc::clone(&cloud),
                config.download_directory.clone(),
                config.skip_directories.clone(),
                config.instance_folder_id,
            ),
            probe: ImportProbe::new(history),
            watchers: Arc::clone(&watchers),
            events_tx: events_tx.clone(),
            tasks_tx,
            poll_interval: config.polling_interval,
            cancel: cancel.clone(),
        });

        let fetch_workers = fetch_pool::spawn_fetch_workers(
            config.download_workers,
            fetcher,
            tasks_rx,
            cancel.clone(),
        );
        let orchestration = (0..config.orchestration_workers)
            .map(|id| OrchestrationWorker::spawn(id, Arc::clone(&ctx), events_rx.clone()))
            .collect();

        let reconciler = Reconciler {
            cloud: &cloud,
            planner: &ctx.planner,
            probe: &ctx.probe,
            seen: &seen,
            events_tx: &events_tx,
            source: &config.instance_name,
            parent_id: config.instance_folder_id,
        };
        if let Err(error) = reconciler.run().await {
            warn!(error = %error, "startup reconciliation failed; continuing with polling");
        }

        let poller = Poller {
            cloud,
            seen,
            events_tx,
            interval: config.polling_interval,
            source: config.instance_name.clone(),
            parent_id: config.instance_folder_id,
            cancel,
        }
        .spawn();

        info!(
            orchestration_workers = config.orchestration_workers,
            download_workers = config.download_workers,
            interval_secs = config.polling_interval.as_secs(),
            "engine started"
        );

        Self {
            poller,
            orchestration,
            fetch_workers,
            watchers,
        }
    }

    /// Number of watchers not yet known to have completed.
    #[must_use]
    pub fn live_watchers(&self) -> usize {
        self.watchers.alive()
    }

    /// Await every engine task. Call after cancelling the root token; the
    /// poller and workers drain their current operation and exit.
    pub async fn shutdown(self) {
        if let Err(error) = self.poller.await {
            warn!(error = %error, "poller join failed");
        }
        for handle in self.orchestration {
            if let Err(error) = handle.await {
                warn!(error = %error, "orchestration worker join failed");
            }
        }
        for handle in self.fetch_workers {
            if let Err(error) = handle.await {
                warn!(error = %error, "fetch worker join failed");
            }
        }
        self.watchers.drain().await;
        info!("engine shutdown complete");
    }
}
