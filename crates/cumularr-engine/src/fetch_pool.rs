//! Fetch worker pool: the consumers of the `download-tasks` channel.

use std::sync::Arc;

use async_channel::Receiver;
use cumularr_core::{DownloadTask, FetchOutcome, TargetFetcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Spawn `count` workers draining the task channel through the fetcher.
///
/// Workers resolve each task's promise with `Success` or `Failed` and never
/// retry; retrying is not this layer's concern.
pub(crate) fn spawn_fetch_workers(
    count: usize,
    fetcher: Arc<dyn TargetFetcher>,
    tasks_rx: Receiver<DownloadTask>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|id| {
            let fetcher = Arc::clone(&fetcher);
            let tasks_rx = tasks_rx.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                debug!(worker = id, "fetch worker started");
                loop {
                    let task = tokio::select! {
                        () = cancel.cancelled() => break,
                        task = tasks_rx.recv() => match task {
                            Ok(task) => task,
                            Err(_) => break,
                        },
                    };
                    let outcome = match fetcher.fetch(&task.target).await {
                        Ok(()) => {
                            debug!(worker = id, target = %task.target, "target fetched");
                            FetchOutcome::Success
                        }
                        Err(error) => {
                            warn!(
                                worker = id,
                                target = %task.target,
                                error = %error,
                                "target fetch failed"
                            );
                            FetchOutcome::Failed
                        }
                    };
                    if task.done.send(outcome).is_err() {
                        debug!(worker = id, "fetch outcome dropped by submitter");
                    }
                }
                debug!(worker = id, "fetch worker stopped");
            })
        })
        .collect()
}
