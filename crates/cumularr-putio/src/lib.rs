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

//! put.io REST client implementing the workspace's [`CloudClient`]
//! capability.
//!
//! Transfer listings are scoped client-side: the live `/transfers/list`
//! endpoint has no parent-folder filter, so the client fetches the full
//! list and applies the instance folder id when one is known, falling back
//! to source-tag matching otherwise. Cleanup calls treat a 404 as success
//! so remote removal stays idempotent.

mod error;

pub use error::{PutioError, PutioResult};

use std::time::Duration;

use async_trait::async_trait;
use cumularr_core::{AccountInfo, CloudClient, FileListing, RemoteFile, RemoteTransfer};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Production API root.
const DEFAULT_BASE_URL: &str = "https://api.put.io/v2";

/// Timeout applied to every API call.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// put.io REST client. Cheap to clone; the inner reqwest client pools
/// connections.
#[derive(Debug, Clone)]
pub struct PutioClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct AccountEnvelope {
    info: AccountInfo,
}

#[derive(Debug, Deserialize)]
struct TransfersEnvelope {
    transfers: Vec<RemoteTransfer>,
}

#[derive(Debug, Deserialize)]
struct TransferEnvelope {
    transfer: RemoteTransfer,
}

#[derive(Debug, Deserialize)]
struct FolderEnvelope {
    file: RemoteFile,
}

#[derive(Debug, Deserialize)]
struct UrlEnvelope {
    url: String,
}

impl PutioClient {
    /// Construct a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns an error when the token cannot be encoded as a header or the
    /// HTTP client cannot be built.
    pub fn new(api_key: &str) -> PutioResult<Self> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|_| PutioError::Endpoint {
            operation: "client.base_url",
        })?;
        Self::with_base_url(api_key, base_url)
    }

    /// Construct a client against an explicit API root. Used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error when the token cannot be encoded as a header or the
    /// HTTP client cannot be built.
    pub fn with_base_url(api_key: &str, base_url: Url) -> PutioResult<Self> {
        let mut token =
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| PutioError::Credential)?;
        token.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|source| PutioError::Build { source })?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, operation: &'static str, path: &[&str]) -> PutioResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| PutioError::Endpoint { operation })?;
            segments.pop_if_empty();
            segments.extend(path);
        }
        Ok(url)
    }

    async fn get_envelope<T>(&self, operation: &'static str, url: Url) -> PutioResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| PutioError::Http {
                operation,
                url: url.to_string(),
                source,
            })?;
        Self::decode(operation, url, response).await
    }

    async fn post_envelope<T>(
        &self,
        operation: &'static str,
        url: Url,
        body: serde_json::Value,
    ) -> PutioResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| PutioError::Http {
                operation,
                url: url.to_string(),
                source,
            })?;
        Self::decode(operation, url, response).await
    }

    /// POST for remote cleanup: gone-already (404) counts as success.
    async fn post_cleanup(
        &self,
        operation: &'static str,
        url: Url,
        body: serde_json::Value,
    ) -> PutioResult<()> {
        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| PutioError::Http {
                operation,
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(operation, url = %url, "remote object already gone");
            return Ok(());
        }
        if !status.is_success() {
            return Err(PutioError::Status {
                operation,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn decode<T>(operation: &'static str, url: Url, response: Response) -> PutioResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(PutioError::Status {
                operation,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.json().await.map_err(|source| PutioError::Decode {
            operation,
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl CloudClient for PutioClient {
    async fn account_info(&self) -> anyhow::Result<AccountInfo> {
        let url = self.endpoint("account.info", &["account", "info"])?;
        let envelope: AccountEnvelope = self.get_envelope("account.info", url).await?;
        Ok(envelope.info)
    }

    async fn list_transfers(
        &self,
        source: Option<&str>,
        parent_id: Option<i64>,
    ) -> anyhow::Result<Vec<RemoteTransfer>> {
        let url = self.endpoint("transfers.list", &["transfers", "list"])?;
        let envelope: TransfersEnvelope = self.get_envelope("transfers.list", url).await?;

        let transfers = envelope
            .transfers
            .into_iter()
            .filter(|transfer| match (parent_id, source) {
                (Some(parent), _) => transfer.save_parent_id == Some(parent),
                (None, Some(tag)) => transfer.source.as_deref() == Some(tag),
                (None, None) => true,
            })
            .collect();
        Ok(transfers)
    }

    async fn get_transfer(&self, transfer_id: u64) -> anyhow::Result<RemoteTransfer> {
        let id = transfer_id.to_string();
        let url = self.endpoint("transfers.get", &["transfers", &id])?;
        let envelope: TransferEnvelope = self.get_envelope("transfers.get", url).await?;
        Ok(envelope.transfer)
    }

    async fn remove_transfer(&self, transfer_id: u64) -> anyhow::Result<()> {
        let url = self.endpoint("transfers.remove", &["transfers", "remove"])?;
        self.post_cleanup(
            "transfers.remove",
            url,
            json!({ "transfer_ids": transfer_id.to_string() }),
        )
        .await?;
        Ok(())
    }

    async fn delete_file(&self, file_id: i64) -> anyhow::Result<()> {
        let url = self.endpoint("files.delete", &["files", "delete"])?;
        self.post_cleanup(
            "files.delete",
            url,
            json!({ "file_ids": file_id.to_string() }),
        )
        .await?;
        Ok(())
    }

    async fn create_folder(&self, name: &str, parent_id: i64) -> anyhow::Result<RemoteFile> {
        let url = self.endpoint("files.create_folder", &["files", "create-folder"])?;
        let envelope: FolderEnvelope = self
            .post_envelope(
                "files.create_folder",
                url,
                json!({ "name": name, "parent_id": parent_id }),
            )
            .await?;
        Ok(envelope.file)
    }

    async fn list_files(&self, parent_id: i64) -> anyhow::Result<FileListing> {
        let mut url = self.endpoint("files.list", &["files", "list"])?;
        url.query_pairs_mut()
            .append_pair("parent_id", &parent_id.to_string());
        let listing: FileListing = self.get_envelope("files.list", url).await?;
        Ok(listing)
    }

    async fn file_url(&self, file_id: i64) -> anyhow::Result<String> {
        let id = file_id.to_string();
        let url = self.endpoint("files.url", &["files", &id, "url"])?;
        let envelope: UrlEnvelope = self.get_envelope("files.url", url).await?;
        Ok(envelope.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> PutioClient {
        let base = Url::parse(&server.base_url()).expect("mock server url");
        PutioClient::with_base_url("test-token", base).expect("client should build")
    }

    #[tokio::test]
    async fn account_info_decodes_envelope() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/account/info")
                    .header("authorization", "Bearer test-token");
                then.status(200)
                    .json_body(serde_json::json!({ "info": { "username": "amelia" } }));
            })
            .await;

        let client = client_for(&server);
        let info = client.account_info().await.expect("account info");
        assert_eq!(info.username, "amelia");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_transfers_scopes_by_parent_then_source() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/transfers/list");
                then.status(200).json_body(serde_json::json!({
                    "transfers": [
                        { "id": 1, "status": "SEEDING", "save_parent_id": 77, "source": "tv1" },
                        { "id": 2, "status": "SEEDING", "save_parent_id": 88, "source": "tv1" },
                        { "id": 3, "status": "SEEDING", "source": "other" }
                    ]
                }));
            })
            .await;

        let client = client_for(&server);

        let scoped = client
            .list_transfers(Some("tv1"), Some(77))
            .await
            .expect("scoped listing");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, 1);

        let by_source = client
            .list_transfers(Some("tv1"), None)
            .await
            .expect("source-filtered listing");
        assert_eq!(by_source.len(), 2);

        let unscoped = client
            .list_transfers(None, None)
            .await
            .expect("unscoped listing");
        assert_eq!(unscoped.len(), 3);
    }

    #[tokio::test]
    async fn remove_transfer_treats_missing_as_success() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/transfers/remove");
                then.status(404);
            })
            .await;

        let client = client_for(&server);
        client
            .remove_transfer(42)
            .await
            .expect("404 should be treated as success");
    }

    #[tokio::test]
    async fn delete_file_surfaces_server_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/files/delete");
                then.status(500);
            })
            .await;

        let client = client_for(&server);
        let error = client
            .delete_file(10)
            .await
            .expect_err("500 should be an error");
        let putio = error
            .downcast_ref::<PutioError>()
            .expect("typed putio error");
        assert!(matches!(putio, PutioError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn file_listing_and_url_resolution() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/files/list")
                    .query_param("parent_id", "10");
                then.status(200).json_body(serde_json::json!({
                    "parent": { "id": 10, "name": "Season 1", "file_type": "FOLDER" },
                    "files": [
                        { "id": 21, "name": "E01.mkv", "file_type": "VIDEO" }
                    ]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/21/url");
                then.status(200)
                    .json_body(serde_json::json!({ "url": "https://dl/21" }));
            })
            .await;

        let client = client_for(&server);
        let listing = client.list_files(10).await.expect("listing");
        assert!(listing.parent.is_folder());
        assert_eq!(listing.files.len(), 1);

        let url = client.file_url(21).await.expect("file url");
        assert_eq!(url, "https://dl/21");
    }

    #[tokio::test]
    async fn create_folder_returns_new_node() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/files/create-folder");
                then.status(200).json_body(serde_json::json!({
                    "file": { "id": 99, "name": "cumularr", "file_type": "FOLDER" }
                }));
            })
            .await;

        let client = client_for(&server);
        let folder = client
            .create_folder("cumularr", 0)
            .await
            .expect("folder created");
        assert_eq!(folder.id, 99);
        assert!(folder.is_folder());
    }
}
