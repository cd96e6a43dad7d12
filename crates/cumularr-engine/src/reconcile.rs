//! Startup reconciliation: classify the transfers that already exist on
//! the remote side before the poller takes over.
//!
//! A transfer whose whole plan is already imported re-enters the state
//! machine at the seed-watch stage without re-downloading anything. Every
//! other transfer is left unseen for the poller to claim on its first tick.

use std::sync::Arc;

use async_channel::Sender;
use cumularr_core::{CloudClient, Transfer, TransferEvent};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::plan::TargetPlanner;
use crate::probe::ImportProbe;
use crate::seen::SeenTransfers;

pub(crate) struct Reconciler<'a> {
    pub(crate) cloud: &'a Arc<dyn CloudClient>,
    pub(crate) planner: &'a TargetPlanner,
    pub(crate) probe: &'a ImportProbe,
    pub(crate) seen: &'a SeenTransfers,
    pub(crate) events_tx: &'a Sender<TransferEvent>,
    pub(crate) source: &'a str,
    pub(crate) parent_id: Option<i64>,
}

impl Reconciler<'_> {
    /// Run reconciliation to completion. Per-transfer failures are logged
    /// and skipped; only a failed listing or a closed channel aborts.
    pub(crate) async fn run(&self) -> EngineResult<()> {
        let transfers = self
            .cloud
            .list_transfers(Some(self.source), self.parent_id)
            .await
            .map_err(|source| EngineError::Remote {
                operation: "transfers.list",
                source,
            })?;
        info!(count = transfers.len(), "reconciling existing transfers");

        for record in &transfers {
            if !record.is_downloadable() {
                continue;
            }
            let transfer = Arc::new(Transfer::from_remote(record));

            let plan = match self.planner.plan(&transfer).await {
                Ok(plan) => plan,
                Err(error) => {
                    warn!(
                        transfer = %transfer,
                        error = %error,
                        "reconciliation planning failed; leaving for the poller"
                    );
                    continue;
                }
            };
            if plan.is_empty() {
                continue;
            }

            if self.probe.plan_imported(&plan).await {
                transfer.set_targets(plan);
                self.seen.insert(record.id);
                info!(transfer = %transfer, "already imported; resuming seed watch");
                self.events_tx
                    .send(TransferEvent::Imported(Arc::clone(&transfer)))
                    .await
                    .map_err(|_| EngineError::ChannelClosed {
                        channel: "transfer-events",
                    })?;
            } else {
                debug!(transfer = %transfer, "not yet imported; leaving for the poller");
            }
        }
        Ok(())
    }
}
