//! Orchestration workers: the consumers of the `transfer-events` channel.
//!
//! A worker drives one event at a time. `QueuedForDownload` runs the whole
//! download leg inline (plan, submit, await completions); `Downloaded` and
//! `Imported` only spawn the matching watcher so the worker is immediately
//! free for the next event. Errors are logged and the loop survives them.

use std::sync::Arc;

use async_channel::Receiver;
use cumularr_core::{DownloadTask, FetchOutcome, Transfer, TransferEvent};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::WorkerContext;
use crate::error::{EngineError, EngineResult};
use crate::watch;

pub(crate) struct OrchestrationWorker {
    id: usize,
    ctx: Arc<WorkerContext>,
    events_rx: Receiver<TransferEvent>,
}

impl OrchestrationWorker {
    pub(crate) fn spawn(
        id: usize,
        ctx: Arc<WorkerContext>,
        events_rx: Receiver<TransferEvent>,
    ) -> JoinHandle<()> {
        let worker = Self { id, ctx, events_rx };
        tokio::spawn(worker.run())
    }

    async fn run(self) {
        debug!(worker = self.id, "orchestration worker started");
        loop {
            let event = tokio::select! {
                () = self.ctx.cancel.cancelled() => break,
                event = self.events_rx.recv() => match event {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };
            if let Err(error) = self.handle(event).await {
                warn!(
                    worker = self.id,
                    error = %error,
                    "transfer event handling failed"
                );
            }
        }
        debug!(worker = self.id, "orchestration worker stopped");
    }

    pub(crate) async fn handle(&self, event: TransferEvent) -> EngineResult<()> {
        match event {
            TransferEvent::QueuedForDownload(transfer) => self.download(transfer).await,
            TransferEvent::Downloaded(transfer) => {
                info!(transfer = %transfer, "watching imports");
                let ctx = Arc::clone(&self.ctx);
                self.ctx
                    .watchers
                    .spawn("import", watch::watch_import(ctx, transfer));
                Ok(())
            }
            TransferEvent::Imported(transfer) => {
                info!(transfer = %transfer, "watching seeding");
                let ctx = Arc::clone(&self.ctx);
                self.ctx
                    .watchers
                    .spawn("seeding", watch::watch_seeding(ctx, transfer));
                Ok(())
            }
        }
    }

    async fn download(&self, transfer: Arc<Transfer>) -> EngineResult<()> {
        info!(transfer = %transfer, "download started");

        let plan = match self.ctx.planner.plan(&transfer).await {
            Ok(plan) => plan,
            Err(error) => {
                warn!(
                    transfer = %transfer,
                    error = %error,
                    "planning failed; dropping transfer"
                );
                return Ok(());
            }
        };
        if plan.is_empty() {
            info!(transfer = %transfer, "plan is empty; dropping transfer");
            return Ok(());
        }

        // Targets go out in plan order; the bounded channel applies
        // backpressure when the fetch pool is saturated.
        let mut pending = Vec::with_capacity(plan.len());
        for target in &plan {
            let (done, outcome) = oneshot::channel();
            self.ctx
                .tasks_tx
                .send(DownloadTask {
                    target: target.clone(),
                    done,
                })
                .await
                .map_err(|_| EngineError::ChannelClosed {
                    channel: "download-tasks",
                })?;
            pending.push(outcome);
        }

        let mut all_downloaded = true;
        for outcome in pending {
            let downloaded = matches!(outcome.await, Ok(FetchOutcome::Success));
            all_downloaded &= downloaded;
        }

        if all_downloaded {
            transfer.set_targets(plan);
            info!(transfer = %transfer, "download done");
            self.ctx
                .events_tx
                .send(TransferEvent::Downloaded(transfer))
                .await
                .map_err(|_| EngineError::ChannelClosed {
                    channel: "transfer-events",
                })?;
        } else {
            warn!(transfer = %transfer, "not all targets downloaded; dropping transfer");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch_pool;
    use crate::plan::TargetPlanner;
    use crate::probe::ImportProbe;
    use crate::testing::{StubCloud, StubFetcher, transfer_record};
    use crate::tracker::WatcherPool;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    struct Rig {
        worker: OrchestrationWorker,
        events_rx: Receiver<TransferEvent>,
        cloud: Arc<StubCloud>,
        fetcher: Arc<StubFetcher>,
        _fetch_workers: Vec<JoinHandle<()>>,
    }

    fn rig(fetcher: StubFetcher) -> Rig {
        let cloud = Arc::new(StubCloud::new());
        let fetcher = Arc::new(fetcher);
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = async_channel::bounded(100);
        let (tasks_tx, tasks_rx) = async_channel::bounded(100);

        let fetch_workers =
            fetch_pool::spawn_fetch_workers(2, Arc::clone(&fetcher) as _, tasks_rx, cancel.clone());

        let ctx = Arc::new(WorkerContext {
            cloud: Arc::clone(&cloud) as _,
            planner: TargetPlanner::new(
                Arc::clone(&cloud) as _,
                PathBuf::from("/dl"),
                vec!["sample".to_string()],
                None,
            ),
            probe: ImportProbe::new(Vec::new()),
            watchers: Arc::new(WatcherPool::new()),
            events_tx,
            tasks_tx,
            poll_interval: Duration::from_millis(10),
            cancel,
        });

        Rig {
            worker: OrchestrationWorker {
                id: 0,
                ctx,
                events_rx: events_rx.clone(),
            },
            events_rx,
            cloud,
            fetcher,
            _fetch_workers: fetch_workers,
        }
    }

    fn queued(file_id: i64) -> (Arc<Transfer>, TransferEvent) {
        let transfer = Arc::new(Transfer::from_remote(&transfer_record(
            1,
            "COMPLETED",
            Some(file_id),
        )));
        (
            Arc::clone(&transfer),
            TransferEvent::QueuedForDownload(transfer),
        )
    }

    #[tokio::test]
    async fn successful_plan_emits_downloaded() {
        let rig = rig(StubFetcher::new());
        rig.cloud.add_file(10, "movie.mkv", "VIDEO", &[]);
        let (transfer, event) = queued(10);

        rig.worker.handle(event).await.expect("handled");

        let next = timeout(Duration::from_secs(1), rig.events_rx.recv())
            .await
            .expect("event in time")
            .expect("channel open");
        assert!(matches!(next, TransferEvent::Downloaded(_)));
        assert_eq!(
            transfer.targets().map(|targets| targets.len()),
            Some(1),
            "plan must be persisted on the transfer"
        );
        assert_eq!(rig.fetcher.fetched().len(), 1);
    }

    #[tokio::test]
    async fn failed_target_drops_the_transfer() {
        let fetcher = StubFetcher::new();
        fetcher.fail_on("/dl/Season 1/E02.mkv");
        let rig = rig(fetcher);
        rig.cloud.add_file(20, "Season 1", "FOLDER", &[21, 22]);
        rig.cloud.add_file(21, "E01.mkv", "VIDEO", &[]);
        rig.cloud.add_file(22, "E02.mkv", "VIDEO", &[]);
        let (transfer, event) = queued(20);

        rig.worker.handle(event).await.expect("handled");

        assert!(
            timeout(Duration::from_millis(100), rig.events_rx.recv())
                .await
                .is_err(),
            "no event may follow a failed download"
        );
        assert!(transfer.targets().is_none());
        assert_eq!(rig.fetcher.fetched().len(), 3);
    }

    #[tokio::test]
    async fn empty_plan_is_dropped_quietly() {
        let rig = rig(StubFetcher::new());
        rig.cloud.add_file(30, "Sample", "FOLDER", &[31]);
        rig.cloud.add_file(31, "sample.mkv", "VIDEO", &[]);
        let (_, event) = queued(30);

        rig.worker.handle(event).await.expect("handled");
        assert!(
            timeout(Duration::from_millis(100), rig.events_rx.recv())
                .await
                .is_err()
        );
        assert!(rig.fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn planning_failure_is_not_fatal() {
        let rig = rig(StubFetcher::new());
        // No file tree scripted: the planner's listing call fails.
        let (_, event) = queued(40);
        rig.worker
            .handle(event)
            .await
            .expect("planning failure must be swallowed");
    }

    #[tokio::test]
    async fn downloaded_event_spawns_import_watcher() {
        let rig = rig(StubFetcher::new());
        let (transfer, _) = queued(10);
        transfer.set_targets(Vec::new());

        rig.worker
            .handle(TransferEvent::Downloaded(transfer))
            .await
            .expect("handled");
        assert_eq!(rig.worker.ctx.watchers.alive(), 1);
        rig.worker.ctx.cancel.cancel();
        rig.worker.ctx.watchers.drain().await;
    }
}
