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

//! TOML configuration for the cumularr daemon: typed model, defaults,
//! validation and a file loader.

mod defaults;
mod error;
mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ArrService, Config};

use std::fs;
use std::path::Path;

impl Config {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is not valid TOML,
    /// or fails validation.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            operation: "config.read",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate a configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is not valid TOML or fails
    /// validation.
    pub fn from_toml(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        validate::validate(&config)?;
        Ok(config)
    }
}
