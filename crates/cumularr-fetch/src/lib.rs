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

//! HTTP file fetcher implementing the workspace's [`TargetFetcher`]
//! capability.
//!
//! File bodies stream into a `.downloading` sibling and are renamed over
//! the final path only on success, so a crashed or cancelled fetch never
//! leaves a half-written file under the final name. Replays are free: an
//! existing final file short-circuits without network IO, and directory
//! targets reduce to an idempotent create.

mod error;

pub use error::{FetchError, FetchResult};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cumularr_core::{DownloadTarget, TargetFetcher, TargetKind};
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Suffix of the temp sibling written during a transfer.
const TEMP_SUFFIX: &str = ".downloading";

/// Timeout covering one whole file download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Streaming HTTP fetcher. Cheap to clone; shared by all fetch workers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    cancel: CancellationToken,
}

impl HttpFetcher {
    /// Construct a fetcher whose requests honour the given cancellation
    /// token.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(cancel: CancellationToken) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|source| FetchError::Build { source })?;
        Ok(Self { client, cancel })
    }

    /// Temp sibling path for a final destination.
    #[must_use]
    pub fn temp_path(to: &Path) -> PathBuf {
        let mut name = to
            .file_name()
            .map_or_else(OsString::new, ToOwned::to_owned);
        name.push(TEMP_SUFFIX);
        to.with_file_name(name)
    }

    async fn ensure_directory(path: &Path) -> FetchResult<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|source| FetchError::io("dir.create", path, source))
    }

    async fn fetch_file(&self, target: &DownloadTarget) -> FetchResult<()> {
        if fs::try_exists(&target.to)
            .await
            .map_err(|source| FetchError::io("file.probe", &target.to, source))?
        {
            debug!(target = %target, "final file already present; skipping fetch");
            return Ok(());
        }

        if let Some(parent) = target.to.parent() {
            Self::ensure_directory(parent).await?;
        }

        let temp = Self::temp_path(&target.to);
        match self.stream_to(&target.from, &temp).await {
            Ok(()) => match fs::rename(&temp, &target.to).await {
                Ok(()) => Ok(()),
                Err(source) => {
                    Self::discard_temp(&temp).await;
                    Err(FetchError::io("file.rename", &target.to, source))
                }
            },
            Err(error) => {
                Self::discard_temp(&temp).await;
                Err(error)
            }
        }
    }

    /// Best effort: the temp may never have been created.
    async fn discard_temp(temp: &Path) {
        if let Err(cleanup) = fs::remove_file(temp).await {
            debug!(path = %temp.display(), error = %cleanup, "temp cleanup skipped");
        }
    }

    async fn stream_to(&self, url: &str, temp: &Path) -> FetchResult<()> {
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let response = tokio::select! {
            () = self.cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.client.get(url).send() => {
                response.map_err(|source| FetchError::Http {
                    url: url.to_string(),
                    source,
                })?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = fs::File::create(temp)
            .await
            .map_err(|source| FetchError::io("temp.create", temp, source))?;
        let mut stream = response.bytes_stream();

        loop {
            let chunk = tokio::select! {
                () = self.cancel.cancelled() => return Err(FetchError::Cancelled),
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    file.write_all(&bytes)
                        .await
                        .map_err(|source| FetchError::io("temp.write", temp, source))?;
                }
                Some(Err(source)) => {
                    return Err(FetchError::Stream {
                        url: url.to_string(),
                        source,
                    });
                }
                None => break,
            }
        }

        file.flush()
            .await
            .map_err(|source| FetchError::io("temp.flush", temp, source))
    }
}

#[async_trait]
impl TargetFetcher for HttpFetcher {
    async fn fetch(&self, target: &DownloadTarget) -> anyhow::Result<()> {
        match target.kind {
            TargetKind::Directory => Self::ensure_directory(&target.to).await?,
            TargetKind::File => self.fetch_file(target).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn file_target(to: PathBuf, from: String) -> DownloadTarget {
        DownloadTarget {
            to,
            from,
            kind: TargetKind::File,
            top_level: true,
            transfer_hash: "abcd".to_string(),
        }
    }

    fn dir_target(to: PathBuf) -> DownloadTarget {
        DownloadTarget {
            to,
            from: String::new(),
            kind: TargetKind::Directory,
            top_level: true,
            transfer_hash: "abcd".to_string(),
        }
    }

    #[tokio::test]
    async fn streams_body_and_renames_over_final_path() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie");
                then.status(200).body("video-bytes");
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let to = dir.path().join("nested").join("movie.mkv");
        let fetcher = HttpFetcher::new(CancellationToken::new()).expect("fetcher");
        fetcher
            .fetch(&file_target(to.clone(), server.url("/movie")))
            .await
            .expect("fetch should succeed");

        let body = std::fs::read(&to).expect("final file present");
        assert_eq!(body, b"video-bytes");
        assert!(!HttpFetcher::temp_path(&to).exists(), "temp must be gone");
    }

    #[tokio::test]
    async fn replay_returns_without_network_io() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/movie");
                then.status(200).body("fresh");
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let to = dir.path().join("movie.mkv");
        std::fs::write(&to, b"already-here").expect("seed final file");

        let fetcher = HttpFetcher::new(CancellationToken::new()).expect("fetcher");
        fetcher
            .fetch(&file_target(to.clone(), server.url("/movie")))
            .await
            .expect("replay should succeed");

        assert_eq!(std::fs::read(&to).expect("file"), b"already-here");
        assert!(!HttpFetcher::temp_path(&to).exists());
        mock.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn http_error_cleans_up_temp_sibling() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie");
                then.status(404);
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let to = dir.path().join("movie.mkv");
        let fetcher = HttpFetcher::new(CancellationToken::new()).expect("fetcher");
        let error = fetcher
            .fetch(&file_target(to.clone(), server.url("/movie")))
            .await
            .expect_err("404 should fail the fetch");

        assert!(error.to_string().contains("status"));
        assert!(!to.exists());
        assert!(!HttpFetcher::temp_path(&to).exists());
    }

    #[tokio::test]
    async fn rename_failure_cleans_up_temp_sibling() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie");
                then.status(200).body("video-bytes");
            })
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        // The trailing separator makes the kernel resolve the rename
        // target as a directory, so the stream succeeds and only the
        // final rename fails.
        let to = PathBuf::from(format!("{}/movie.mkv/", dir.path().display()));
        let fetcher = HttpFetcher::new(CancellationToken::new()).expect("fetcher");

        let error = fetcher
            .fetch(&file_target(to.clone(), server.url("/movie")))
            .await
            .expect_err("rename onto a directory path must fail");
        assert!(
            error.downcast_ref::<FetchError>().is_some_and(|fetch| matches!(
                fetch,
                FetchError::Io {
                    operation: "file.rename",
                    ..
                }
            )),
            "expected rename failure, got {error:?}"
        );
        assert!(
            !HttpFetcher::temp_path(&to).exists(),
            "temp sibling must be cleaned up after a failed rename"
        );
    }

    #[tokio::test]
    async fn directory_targets_create_idempotently() {
        let dir = tempfile::tempdir().expect("tempdir");
        let to = dir.path().join("Season 1");
        let fetcher = HttpFetcher::new(CancellationToken::new()).expect("fetcher");

        fetcher
            .fetch(&dir_target(to.clone()))
            .await
            .expect("first create");
        fetcher
            .fetch(&dir_target(to.clone()))
            .await
            .expect("second create is a no-op");
        assert!(to.is_dir());
    }

    #[tokio::test]
    async fn cancelled_token_aborts_before_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/movie");
                then.status(200).body("late");
            })
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let dir = tempfile::tempdir().expect("tempdir");
        let to = dir.path().join("movie.mkv");
        let fetcher = HttpFetcher::new(cancel).expect("fetcher");

        let error = fetcher
            .fetch(&file_target(to.clone(), server.url("/movie")))
            .await
            .expect_err("cancelled fetch should fail");
        assert!(
            error.downcast_ref::<FetchError>().is_some_and(|fetch| matches!(
                fetch,
                FetchError::Cancelled
            )),
            "expected cancellation error, got {error:?}"
        );
        assert!(!to.exists());
        mock.assert_calls_async(0).await;
    }

    #[test]
    fn temp_path_appends_suffix() {
        let temp = HttpFetcher::temp_path(Path::new("/dl/Season 1/E01.mkv"));
        assert_eq!(temp, PathBuf::from("/dl/Season 1/E01.mkv.downloading"));
    }
}
