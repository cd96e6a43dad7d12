//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration path for packaged installs.
const DEFAULT_CONFIG_PATH: &str = "/etc/cumularr/config.toml";

/// Cloud download bridge for Sonarr, Radarr and Whisparr.
#[derive(Debug, Parser)]
#[command(name = "cumularr", version, about)]
pub(crate) struct Cli {
    /// Path to the configuration file.
    #[arg(long, env = "CUMULARR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub(crate) config: PathBuf,

    /// Validate the configuration and the put.io credential, then exit.
    #[arg(long)]
    pub(crate) check: bool,
}
