//! Application bootstrap: configuration, credential verification,
//! instance-folder resolution and engine launch.

use std::sync::Arc;

use cumularr_arr::ArrClient;
use cumularr_config::Config;
use cumularr_core::{CloudClient, ImportHistory, TargetFetcher};
use cumularr_engine::Engine;
use cumularr_fetch::HttpFetcher;
use cumularr_putio::PutioClient;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::Cli;
use crate::error::{AppError, AppResult};

/// Remote root folder id.
const REMOTE_ROOT: i64 = 0;

/// Boot sequence: load configuration, verify the put.io account, resolve
/// the instance folder, then run the engine until a shutdown signal.
pub(crate) async fn run(cli: Cli) -> AppResult<()> {
    let mut config = Config::load(&cli.config).map_err(|source| AppError::Config {
        operation: "config.load",
        source,
    })?;
    info!(path = %cli.config.display(), "configuration loaded");

    let cloud: Arc<dyn CloudClient> = Arc::new(
        PutioClient::new(&config.api_key).map_err(|source| AppError::Putio {
            operation: "putio.client",
            source,
        })?,
    );

    let account = cloud
        .account_info()
        .await
        .map_err(|source| AppError::Remote {
            operation: "account.info",
            source,
        })?;
    info!(username = %account.username, "authenticated with put.io");

    if cli.check {
        info!("configuration check passed");
        return Ok(());
    }

    if config.instance_folder_id.is_none() {
        let folder_id = resolve_instance_folder(cloud.as_ref(), &config.instance_name).await?;
        config.instance_folder_id = Some(folder_id);
    }

    let history = build_history(&config)?;
    info!(services = history.len(), "import history probes configured");

    let cancel = CancellationToken::new();
    let fetcher: Arc<dyn TargetFetcher> = Arc::new(
        HttpFetcher::new(cancel.clone()).map_err(|source| AppError::Fetch {
            operation: "fetcher.client",
            source,
        })?,
    );

    let engine = Engine::start(&config, cloud, history, fetcher, cancel.clone()).await;

    tokio::signal::ctrl_c()
        .await
        .map_err(|source| AppError::Io {
            operation: "signal.ctrl_c",
            source,
        })?;
    info!("shutdown signal received; cancelling engine tasks");
    cancel.cancel();
    engine.shutdown().await;
    Ok(())
}

/// Find or create the remote folder this instance saves transfers under.
async fn resolve_instance_folder(cloud: &dyn CloudClient, name: &str) -> AppResult<i64> {
    let listing = cloud
        .list_files(REMOTE_ROOT)
        .await
        .map_err(|source| AppError::Remote {
            operation: "files.list",
            source,
        })?;

    if let Some(existing) = listing
        .files
        .iter()
        .find(|file| file.is_folder() && file.name == name)
    {
        info!(folder_id = existing.id, "using existing instance folder");
        return Ok(existing.id);
    }

    let folder = cloud
        .create_folder(name, REMOTE_ROOT)
        .await
        .map_err(|source| AppError::Remote {
            operation: "files.create_folder",
            source,
        })?;
    info!(folder_id = folder.id, "created instance folder");
    Ok(folder.id)
}

/// Build one history probe per configured Arr service, in probe order.
fn build_history(config: &Config) -> AppResult<Vec<Arc<dyn ImportHistory>>> {
    config
        .arr_services()
        .map(|(kind, service)| {
            let client = ArrClient::new(kind, &service.url, &service.api_key).map_err(
                |source| AppError::Arr {
                    operation: "arr.client",
                    source,
                },
            )?;
            Ok(Arc::new(client) as Arc<dyn ImportHistory>)
        })
        .collect()
}
