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

//! Arr history client implementing the workspace's [`ImportHistory`]
//! capability.
//!
//! A path counts as imported when the service's `/api/v3/history` feed
//! contains a `downloadFolderImported` event whose `droppedPath` matches.
//! The feed is walked page by page (page size 1000) until a match is found
//! or `totalRecords` records have been inspected.

mod error;

pub use error::{ArrError, ArrResult};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use cumularr_core::{ImportHistory, ProbeError};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::trace;
use url::Url;

/// History page size requested per query.
const PAGE_SIZE: u64 = 1_000;

/// History event type recording a completed import.
const IMPORTED_EVENT: &str = "downloadFolderImported";

/// Timeout applied to every history query.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the service API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// History client for one configured Arr service.
#[derive(Debug, Clone)]
pub struct ArrClient {
    name: String,
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPage {
    total_records: u64,
    #[serde(default)]
    records: Vec<HistoryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    data: HistoryData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryData {
    #[serde(default)]
    dropped_path: Option<String>,
}

impl HistoryRecord {
    fn matches(&self, dropped_path: &str) -> bool {
        self.event_type.as_deref() == Some(IMPORTED_EVENT)
            && self.data.dropped_path.as_deref() == Some(dropped_path)
    }
}

impl ArrClient {
    /// Construct a client for one configured service.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is invalid, the API key cannot be
    /// encoded as a header, or the HTTP client cannot be built.
    pub fn new(name: impl Into<String>, base_url: &str, api_key: &str) -> ArrResult<Self> {
        let base_url = Url::parse(base_url).map_err(|_| ArrError::Endpoint {
            url: base_url.to_string(),
        })?;

        let mut key = HeaderValue::from_str(api_key).map_err(|_| ArrError::Credential)?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|source| ArrError::Build { source })?;

        Ok(Self {
            name: name.into(),
            client,
            base_url,
        })
    }

    fn history_endpoint(&self, page: u64) -> ArrResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| ArrError::Endpoint {
                url: self.base_url.to_string(),
            })?;
            segments.pop_if_empty();
            segments.extend(["api", "v3", "history"]);
        }
        url.query_pairs_mut()
            .append_pair("includeSeries", "false")
            .append_pair("includeEpisode", "false")
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &PAGE_SIZE.to_string());
        Ok(url)
    }

    async fn history_page(&self, page: u64) -> ArrResult<HistoryPage> {
        let url = self.history_endpoint(page)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ArrError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ArrError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|source| ArrError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn find_import(&self, dropped_path: &str) -> ArrResult<bool> {
        let mut page = 1;
        let mut inspected: u64 = 0;
        loop {
            let history = self.history_page(page).await?;
            let fetched = history.records.len() as u64;
            trace!(
                service = %self.name,
                page,
                fetched,
                total = history.total_records,
                "inspecting history page"
            );

            if history
                .records
                .iter()
                .any(|record| record.matches(dropped_path))
            {
                return Ok(true);
            }

            inspected += fetched;
            if fetched == 0 || inspected >= history.total_records {
                return Ok(false);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl ImportHistory for ArrClient {
    fn service_name(&self) -> &str {
        &self.name
    }

    async fn was_imported(&self, dropped_path: &Path) -> Result<bool, ProbeError> {
        let path = dropped_path.to_string_lossy();
        self.find_import(path.as_ref()).await.map_err(|error| {
            if error.is_unreachable() {
                ProbeError::Unreachable {
                    service: self.name.clone(),
                    source: error.into(),
                }
            } else {
                ProbeError::Query {
                    service: self.name.clone(),
                    source: error.into(),
                }
            }
        })
    }
}
