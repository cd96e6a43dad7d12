//! # Design
//!
//! - Centralize application-level errors for bootstrap and wiring.
//! - Keep error messages constant while carrying context fields.
//! - Preserve source errors without re-logging at call sites.

use std::io;

use thiserror::Error;

/// Result alias for application operations.
pub(crate) type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    /// Configuration loading or validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: cumularr_config::ConfigError,
    },
    /// Logging could not be initialised.
    #[error("logging initialisation failed")]
    Logging {
        /// Source error from the subscriber.
        source: anyhow::Error,
    },
    /// The put.io client could not be constructed.
    #[error("putio client operation failed")]
    Putio {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: cumularr_putio::PutioError,
    },
    /// An Arr history client could not be constructed.
    #[error("arr client operation failed")]
    Arr {
        /// Operation identifier.
        operation: &'static str,
        /// Source client error.
        source: cumularr_arr::ArrError,
    },
    /// The file fetcher could not be constructed.
    #[error("fetcher operation failed")]
    Fetch {
        /// Operation identifier.
        operation: &'static str,
        /// Source fetcher error.
        source: cumularr_fetch::FetchError,
    },
    /// A remote call during bootstrap failed.
    #[error("remote operation failed")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// Source remote error.
        source: anyhow::Error,
    },
    /// Signal handling failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}
