//! Import and seed watchers: the per-transfer background tasks spawned
//! after the download leg completes.

use std::sync::Arc;

use cumularr_core::{Transfer, TransferEvent};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::context::{WorkerContext, idle};
use crate::error::EngineError;

/// Poll the Arr services until every file target of the transfer has been
/// imported, then delete the local artifact and re-enter the state machine
/// with `Imported`.
pub(crate) async fn watch_import(
    ctx: Arc<WorkerContext>,
    transfer: Arc<Transfer>,
) -> anyhow::Result<()> {
    let targets = transfer.targets().ok_or(EngineError::PlanMissing {
        transfer_id: transfer.transfer_id,
    })?;

    loop {
        if ctx.probe.plan_imported(&targets).await {
            info!(transfer = %transfer, "imported");
            remove_local_artifact(&transfer).await;
            ctx.events_tx
                .send(TransferEvent::Imported(Arc::clone(&transfer)))
                .await
                .map_err(|_| EngineError::ChannelClosed {
                    channel: "transfer-events",
                })?;
            return Ok(());
        }
        if idle(&ctx.cancel, ctx.poll_interval).await {
            debug!(transfer = %transfer, "import watch cancelled");
            return Ok(());
        }
    }
}

/// Poll the remote transfer until it stops seeding, then clean up the
/// remote side best-effort.
pub(crate) async fn watch_seeding(
    ctx: Arc<WorkerContext>,
    transfer: Arc<Transfer>,
) -> anyhow::Result<()> {
    loop {
        match ctx.cloud.get_transfer(transfer.transfer_id).await {
            Ok(remote) if remote.status_kind().is_seeding() => {}
            Ok(remote) => {
                info!(transfer = %transfer, status = %remote.status, "stopped seeding");
                cleanup_remote(&ctx, &transfer).await;
                info!(transfer = %transfer, "done seeding");
                return Ok(());
            }
            Err(error) => {
                warn!(transfer = %transfer, error = %error, "transfer status poll failed");
            }
        }
        if idle(&ctx.cancel, ctx.poll_interval).await {
            debug!(transfer = %transfer, "seed watch cancelled");
            return Ok(());
        }
    }
}

/// Delete the transfer's top-level local artifact. Already-gone is fine.
async fn remove_local_artifact(transfer: &Transfer) {
    let Some(top_level) = transfer.top_level_target() else {
        return;
    };

    let result = match fs::metadata(&top_level.to).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&top_level.to).await,
        Ok(_) => fs::remove_file(&top_level.to).await,
        Err(_) => {
            debug!(target = %top_level, "local artifact already absent");
            return;
        }
    };

    match result {
        Ok(()) => info!(target = %top_level, "deleted local artifact"),
        Err(error) => warn!(
            target = %top_level,
            error = %error,
            "unable to delete local artifact"
        ),
    }
}

async fn cleanup_remote(ctx: &WorkerContext, transfer: &Transfer) {
    match ctx.cloud.remove_transfer(transfer.transfer_id).await {
        Ok(()) => info!(transfer = %transfer, "removed remote transfer"),
        Err(error) => warn!(
            transfer = %transfer,
            error = %error,
            "unable to remove remote transfer"
        ),
    }

    if let Some(file_id) = transfer.file_id {
        match ctx.cloud.delete_file(file_id).await {
            Ok(()) => info!(transfer = %transfer, "deleted remote files"),
            Err(error) => warn!(
                transfer = %transfer,
                error = %error,
                "unable to delete remote files"
            ),
        }
    }
}
