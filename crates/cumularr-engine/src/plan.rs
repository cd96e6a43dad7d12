//! Builds the ordered download plan for one transfer by walking its remote
//! file tree.
//!
//! Directories are emitted before their contents, the whole subtree of a
//! skipped folder is elided, and a directory with no surviving descendants
//! is suppressed entirely. Exactly one target in a non-empty plan carries
//! the `top_level` flag: the node the walk started from.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use cumularr_core::{CloudClient, DownloadTarget, RemoteFile, TargetKind, Transfer};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Subtitle extensions planned alongside video files.
const SUBTITLE_EXTENSIONS: [&str; 5] = ["srt", "sub", "vtt", "ssa", "ass"];

/// Plans download targets for transfers under a single download root.
pub struct TargetPlanner {
    cloud: Arc<dyn CloudClient>,
    download_root: PathBuf,
    skip_directories: Vec<String>,
    instance_folder_id: Option<i64>,
}

impl TargetPlanner {
    /// Construct a planner.
    #[must_use]
    pub fn new(
        cloud: Arc<dyn CloudClient>,
        download_root: PathBuf,
        skip_directories: Vec<String>,
        instance_folder_id: Option<i64>,
    ) -> Self {
        Self {
            cloud,
            download_root,
            skip_directories,
            instance_folder_id,
        }
    }

    /// Compute the ordered plan for a transfer.
    ///
    /// # Errors
    ///
    /// Returns an error when the transfer has no file tree yet, was saved
    /// outside the configured instance folder, or a remote listing fails.
    pub async fn plan(&self, transfer: &Transfer) -> EngineResult<Vec<DownloadTarget>> {
        let file_id = transfer.file_id.ok_or(EngineError::MissingFileId {
            transfer_id: transfer.transfer_id,
        })?;

        // Guards against scope leakage when the listing was unscoped.
        if let (Some(expected), Some(actual)) = (self.instance_folder_id, transfer.save_parent_id)
            && expected != actual
        {
            return Err(EngineError::FolderMismatch {
                transfer_id: transfer.transfer_id,
                expected,
                actual,
            });
        }

        let hash = transfer.display_hash().to_string();
        let plan = self
            .walk(file_id, hash, self.download_root.clone(), true)
            .await?;
        debug!(
            transfer = %transfer,
            targets = plan.len(),
            "computed download plan"
        );
        Ok(plan)
    }

    fn walk(
        &self,
        file_id: i64,
        hash: String,
        base: PathBuf,
        top_level: bool,
    ) -> Pin<Box<dyn Future<Output = EngineResult<Vec<DownloadTarget>>> + Send + '_>> {
        Box::pin(async move {
            let listing =
                self.cloud
                    .list_files(file_id)
                    .await
                    .map_err(|source| EngineError::Remote {
                        operation: "files.list",
                        source,
                    })?;

            let local = base.join(&listing.parent.name);

            if listing.parent.is_folder() {
                if self.skips(&listing.parent.name) {
                    debug!(folder = %listing.parent.name, "skipped folder; eliding subtree");
                    return Ok(Vec::new());
                }

                let mut children = Vec::new();
                for child in &listing.files {
                    if child.is_folder() {
                        children
                            .extend(self.walk(child.id, hash.clone(), local.clone(), false).await?);
                    } else if let Some(target) =
                        self.file_target(child, &local, hash.clone(), false).await?
                    {
                        children.push(target);
                    }
                }

                if children.is_empty() {
                    return Ok(Vec::new());
                }

                let mut plan = vec![DownloadTarget {
                    to: local,
                    from: String::new(),
                    kind: TargetKind::Directory,
                    top_level,
                    transfer_hash: hash,
                }];
                plan.extend(children);
                return Ok(plan);
            }

            let target = self
                .file_target(&listing.parent, &base, hash, top_level)
                .await?;
            Ok(target.into_iter().collect())
        })
    }

    async fn file_target(
        &self,
        file: &RemoteFile,
        base: &Path,
        hash: String,
        top_level: bool,
    ) -> EngineResult<Option<DownloadTarget>> {
        if !file.is_video() && !has_subtitle_extension(&file.name) {
            return Ok(None);
        }

        let from = self
            .cloud
            .file_url(file.id)
            .await
            .map_err(|source| EngineError::Remote {
                operation: "files.url",
                source,
            })?;

        Ok(Some(DownloadTarget {
            to: base.join(&file.name),
            from,
            kind: TargetKind::File,
            top_level,
            transfer_hash: hash,
        }))
    }

    fn skips(&self, name: &str) -> bool {
        self.skip_directories
            .iter()
            .any(|skip| skip.eq_ignore_ascii_case(name))
    }
}

fn has_subtitle_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            SUBTITLE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}
