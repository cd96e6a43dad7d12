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

//! Engine-agnostic transfer interfaces and DTOs shared across the workspace.
//!
//! This crate carries the process-local mirror of a remote transfer, the
//! download-plan types produced by the planner, the events that drive the
//! orchestration state machine, and the capability traits the engine
//! consumes: the remote cloud service, the Arr import-history probes, and
//! the file fetcher.

mod error;
mod remote;
mod target;
mod transfer;

pub use error::ProbeError;
pub use remote::{AccountInfo, FileListing, RemoteFile, RemoteTransfer};
pub use target::{DownloadTarget, DownloadTask, FetchOutcome, TargetKind};
pub use transfer::{Transfer, TransferEvent, TransferStatus};

use std::path::Path;

use async_trait::async_trait;

/// Remote cloud service the engine drives: transfer listing and lifecycle,
/// file-tree walking, URL resolution and remote cleanup.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Fetch account details for the configured credential.
    async fn account_info(&self) -> anyhow::Result<AccountInfo>;

    /// List live transfers, scoped to a source tag and/or parent folder.
    ///
    /// Both filters are optional; implementations apply whichever scoping
    /// the remote endpoint supports and filter the remainder client-side.
    async fn list_transfers(
        &self,
        source: Option<&str>,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Vec<RemoteTransfer>>;

    /// Fetch a single transfer by id.
    async fn get_transfer(&self, transfer_id: u64) -> anyhow::Result<RemoteTransfer>;

    /// Remove a transfer from the remote service. Gone-already is success.
    async fn remove_transfer(&self, transfer_id: u64) -> anyhow::Result<()>;

    /// Delete a remote file or folder tree. Gone-already is success.
    async fn delete_file(&self, file_id: i64) -> anyhow::Result<()>;

    /// Create a folder under `parent_id` and return it.
    async fn create_folder(&self, name: &str, parent_id: i64) -> anyhow::Result<RemoteFile>;

    /// List the children of a remote folder together with the folder itself.
    async fn list_files(&self, parent_id: i64) -> anyhow::Result<FileListing>;

    /// Resolve the direct download URL for a remote file.
    async fn file_url(&self, file_id: i64) -> anyhow::Result<String>;
}

/// Import-history probe against one configured Arr service.
#[async_trait]
pub trait ImportHistory: Send + Sync {
    /// Service label used for log attribution (e.g. `Sonarr`).
    fn service_name(&self) -> &str;

    /// Whether this service recorded a completed import for the given
    /// absolute local path.
    async fn was_imported(&self, dropped_path: &Path) -> Result<bool, ProbeError>;
}

/// Materializes one [`DownloadTarget`] onto local disk.
#[async_trait]
pub trait TargetFetcher: Send + Sync {
    /// Fetch the target: stream the file body for `File` targets, ensure
    /// the directory exists for `Directory` targets. Must be idempotent.
    async fn fetch(&self, target: &DownloadTarget) -> anyhow::Result<()>;
}
