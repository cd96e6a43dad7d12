//! In-memory capability stubs shared by the engine's unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use cumularr_core::{
    AccountInfo, CloudClient, DownloadTarget, FileListing, ImportHistory, ProbeError, RemoteFile,
    RemoteTransfer, TargetFetcher, TargetKind,
};

/// Scripted cloud service: a static file tree, a scripted transfer list,
/// and recorders for the cleanup calls.
#[derive(Default)]
pub(crate) struct StubCloud {
    files: Mutex<HashMap<i64, (RemoteFile, Vec<i64>)>>,
    transfers: Mutex<Vec<RemoteTransfer>>,
    statuses: Mutex<HashMap<u64, VecDeque<String>>>,
    removed: Mutex<Vec<u64>>,
    deleted: Mutex<Vec<i64>>,
    fail_listing: Mutex<bool>,
}

impl StubCloud {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_file(&self, id: i64, name: &str, file_type: &str, children: &[i64]) {
        let node = RemoteFile {
            id,
            name: name.to_string(),
            content_type: String::new(),
            file_type: file_type.to_string(),
        };
        self.files
            .lock()
            .expect("files lock")
            .insert(id, (node, children.to_vec()));
    }

    pub(crate) fn set_transfers(&self, transfers: Vec<RemoteTransfer>) {
        *self.transfers.lock().expect("transfers lock") = transfers;
    }

    /// Queue a status for `get_transfer`; the last queued status repeats.
    pub(crate) fn push_status(&self, transfer_id: u64, status: &str) {
        self.statuses
            .lock()
            .expect("statuses lock")
            .entry(transfer_id)
            .or_default()
            .push_back(status.to_string());
    }

    pub(crate) fn set_listing_failure(&self, fail: bool) {
        *self.fail_listing.lock().expect("failure lock") = fail;
    }

    pub(crate) fn removed(&self) -> Vec<u64> {
        self.removed.lock().expect("removed lock").clone()
    }

    pub(crate) fn deleted(&self) -> Vec<i64> {
        self.deleted.lock().expect("deleted lock").clone()
    }
}

#[async_trait]
impl CloudClient for StubCloud {
    async fn account_info(&self) -> anyhow::Result<AccountInfo> {
        Ok(AccountInfo {
            username: "stub".to_string(),
            mail: None,
        })
    }

    async fn list_transfers(
        &self,
        _source: Option<&str>,
        _parent_id: Option<i64>,
    ) -> anyhow::Result<Vec<RemoteTransfer>> {
        if *self.fail_listing.lock().expect("failure lock") {
            bail!("scripted listing failure");
        }
        Ok(self.transfers.lock().expect("transfers lock").clone())
    }

    async fn get_transfer(&self, transfer_id: u64) -> anyhow::Result<RemoteTransfer> {
        let mut statuses = self.statuses.lock().expect("statuses lock");
        let queue = statuses
            .get_mut(&transfer_id)
            .ok_or_else(|| anyhow!("no scripted status for transfer {transfer_id}"))?;
        let status = if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue.front().cloned().expect("non-empty queue")
        };
        Ok(transfer_record(transfer_id, &status, None))
    }

    async fn remove_transfer(&self, transfer_id: u64) -> anyhow::Result<()> {
        self.removed.lock().expect("removed lock").push(transfer_id);
        Ok(())
    }

    async fn delete_file(&self, file_id: i64) -> anyhow::Result<()> {
        self.deleted.lock().expect("deleted lock").push(file_id);
        Ok(())
    }

    async fn create_folder(&self, name: &str, _parent_id: i64) -> anyhow::Result<RemoteFile> {
        Ok(RemoteFile {
            id: 1,
            name: name.to_string(),
            content_type: String::new(),
            file_type: "FOLDER".to_string(),
        })
    }

    async fn list_files(&self, parent_id: i64) -> anyhow::Result<FileListing> {
        let files = self.files.lock().expect("files lock");
        let (parent, children) = files
            .get(&parent_id)
            .ok_or_else(|| anyhow!("unknown file id {parent_id}"))?;
        let listed = children
            .iter()
            .map(|child| {
                files
                    .get(child)
                    .map(|(node, _)| node.clone())
                    .ok_or_else(|| anyhow!("unknown child id {child}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(FileListing {
            parent: parent.clone(),
            files: listed,
        })
    }

    async fn file_url(&self, file_id: i64) -> anyhow::Result<String> {
        Ok(format!("https://dl/{file_id}"))
    }
}

/// Build a remote transfer record for fixtures.
pub(crate) fn transfer_record(id: u64, status: &str, file_id: Option<i64>) -> RemoteTransfer {
    RemoteTransfer {
        id,
        hash: Some("abcd".to_string()),
        name: Some(format!("transfer-{id}")),
        size: Some(100),
        downloaded: Some(100),
        estimated_time: None,
        status: status.to_string(),
        started_at: None,
        finished_at: None,
        file_id,
        save_parent_id: None,
        source: None,
        userfile_exists: true,
        error_message: None,
    }
}

/// Scripted import-history service.
pub(crate) struct StubHistory {
    name: String,
    imported: Mutex<HashSet<PathBuf>>,
    failure: Mutex<Option<StubProbeFailure>>,
}

#[derive(Clone, Copy)]
pub(crate) enum StubProbeFailure {
    Unreachable,
    Query,
}

impl StubHistory {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            imported: Mutex::new(HashSet::new()),
            failure: Mutex::new(None),
        }
    }

    pub(crate) fn mark_imported(&self, path: impl Into<PathBuf>) {
        self.imported
            .lock()
            .expect("imported lock")
            .insert(path.into());
    }

    pub(crate) fn set_failure(&self, failure: Option<StubProbeFailure>) {
        *self.failure.lock().expect("failure lock") = failure;
    }
}

#[async_trait]
impl ImportHistory for StubHistory {
    fn service_name(&self) -> &str {
        &self.name
    }

    async fn was_imported(&self, dropped_path: &Path) -> Result<bool, ProbeError> {
        if let Some(failure) = *self.failure.lock().expect("failure lock") {
            return Err(match failure {
                StubProbeFailure::Unreachable => ProbeError::Unreachable {
                    service: self.name.clone(),
                    source: anyhow!("connection refused"),
                },
                StubProbeFailure::Query => ProbeError::Query {
                    service: self.name.clone(),
                    source: anyhow!("scripted query failure"),
                },
            });
        }
        Ok(self
            .imported
            .lock()
            .expect("imported lock")
            .contains(dropped_path))
    }
}

/// Recording fetcher; optionally materializes targets on disk so cleanup
/// paths can be exercised.
#[derive(Default)]
pub(crate) struct StubFetcher {
    fetched: Mutex<Vec<DownloadTarget>>,
    fail_paths: Mutex<HashSet<PathBuf>>,
    materialize: bool,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn materializing() -> Self {
        Self {
            materialize: true,
            ..Self::default()
        }
    }

    pub(crate) fn fail_on(&self, path: impl Into<PathBuf>) {
        self.fail_paths
            .lock()
            .expect("fail lock")
            .insert(path.into());
    }

    pub(crate) fn fetched(&self) -> Vec<DownloadTarget> {
        self.fetched.lock().expect("fetched lock").clone()
    }
}

#[async_trait]
impl TargetFetcher for StubFetcher {
    async fn fetch(&self, target: &DownloadTarget) -> anyhow::Result<()> {
        self.fetched
            .lock()
            .expect("fetched lock")
            .push(target.clone());
        if self.fail_paths.lock().expect("fail lock").contains(&target.to) {
            bail!("scripted fetch failure");
        }
        if self.materialize {
            match target.kind {
                TargetKind::Directory => std::fs::create_dir_all(&target.to)?,
                TargetKind::File => {
                    if let Some(parent) = target.to.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target.to, b"stub-bytes")?;
                }
            }
        }
        Ok(())
    }
}
