//! Typed configuration model.
//!
//! # Design
//! - Pure data carriers deserialized from the TOML document.
//! - Defaults live in `defaults.rs`; invariants in `validate.rs`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::defaults;

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// put.io OAuth token.
    pub api_key: String,
    /// Root of all local download plans.
    pub download_directory: PathBuf,
    /// Cadence for the poller and both watcher kinds, in seconds.
    #[serde(
        default = "defaults::polling_interval",
        deserialize_with = "duration_from_secs"
    )]
    pub polling_interval: Duration,
    /// Number of orchestration worker tasks.
    #[serde(default = "defaults::orchestration_workers")]
    pub orchestration_workers: usize,
    /// Number of file-fetch worker tasks.
    #[serde(default = "defaults::download_workers")]
    pub download_workers: usize,
    /// Folder names elided from download plans, matched case-insensitively.
    #[serde(default = "defaults::skip_directories")]
    pub skip_directories: Vec<String>,
    /// Short tag identifying this deployment on the remote side.
    pub instance_name: String,
    /// Remote folder this instance saves transfers under; resolved at boot
    /// when absent.
    #[serde(default)]
    pub instance_folder_id: Option<i64>,
    /// Sonarr endpoints polled for import confirmation.
    #[serde(default)]
    pub sonarr: Vec<ArrService>,
    /// Radarr endpoints polled for import confirmation.
    #[serde(default)]
    pub radarr: Vec<ArrService>,
    /// Whisparr endpoints polled for import confirmation.
    #[serde(default)]
    pub whisparr: Vec<ArrService>,
}

/// One Arr service endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArrService {
    /// Base URL of the service, e.g. `http://localhost:8989`.
    pub url: String,
    /// API key sent as `X-Api-Key`.
    pub api_key: String,
}

impl Config {
    /// Configured Arr services in probe order, labelled by kind.
    pub fn arr_services(&self) -> impl Iterator<Item = (&'static str, &ArrService)> {
        self.sonarr
            .iter()
            .map(|service| ("Sonarr", service))
            .chain(self.radarr.iter().map(|service| ("Radarr", service)))
            .chain(self.whisparr.iter().map(|service| ("Whisparr", service)))
    }

}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(seconds))
}
