//! Transfer poller: the producer side of the `transfer-events` channel.
//!
//! Each tick lists the live transfers scoped to this instance, queues every
//! new downloadable one exactly once, and prunes the seen set so remotely
//! removed transfers can be re-processed if they ever come back. Listing
//! failures are logged and retried on the next tick; the loop only ends on
//! cancellation or engine shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use cumularr_core::{CloudClient, Transfer, TransferEvent};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::idle;
use crate::error::{EngineError, EngineResult};
use crate::seen::SeenTransfers;

/// Minimum spacing between `active transfers` summary logs.
const SUMMARY_PERIOD: Duration = Duration::from_secs(60);

pub(crate) struct Poller {
    pub(crate) cloud: Arc<dyn CloudClient>,
    pub(crate) seen: Arc<SeenTransfers>,
    pub(crate) events_tx: Sender<TransferEvent>,
    pub(crate) interval: Duration,
    pub(crate) source: String,
    pub(crate) parent_id: Option<i64>,
    pub(crate) cancel: CancellationToken,
}

impl Poller {
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        debug!(source = %self.source, "poller started");
        let mut last_summary: Option<Instant> = None;
        loop {
            match self.tick(&mut last_summary).await {
                Ok(()) => {}
                Err(EngineError::ChannelClosed { .. }) => break,
                Err(error) => {
                    warn!(error = %error, "transfer listing failed; retrying next tick");
                }
            }
            if idle(&self.cancel, self.interval).await {
                break;
            }
        }
        debug!("poller stopped");
    }

    pub(crate) async fn tick(&self, last_summary: &mut Option<Instant>) -> EngineResult<()> {
        let transfers = self
            .cloud
            .list_transfers(Some(&self.source), self.parent_id)
            .await
            .map_err(|source| EngineError::Remote {
                operation: "transfers.list",
                source,
            })?;

        if last_summary.is_none_or(|at| at.elapsed() >= SUMMARY_PERIOD) {
            info!(active = transfers.len(), "active transfers");
            *last_summary = Some(Instant::now());
        }

        for record in &transfers {
            if self.seen.contains(record.id) {
                continue;
            }
            if !record.is_downloadable() {
                debug!(transfer_id = record.id, "transfer not downloadable yet");
                continue;
            }
            let transfer = Arc::new(Transfer::from_remote(record));
            info!(transfer = %transfer, "queueing transfer for download");
            self.events_tx
                .send(TransferEvent::QueuedForDownload(transfer))
                .await
                .map_err(|_| EngineError::ChannelClosed {
                    channel: "transfer-events",
                })?;
            self.seen.insert(record.id);
        }

        let live: HashSet<u64> = transfers.iter().map(|record| record.id).collect();
        self.seen.prune(&live);
        Ok(())
    }
}
