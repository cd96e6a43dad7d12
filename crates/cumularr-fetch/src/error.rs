//! # Design
//!
//! - Structured, constant-message errors for the download pipeline.
//! - IO variants carry operation + path so a failed fetch is reproducible
//!   from the log line alone.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors produced while materializing a download target.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("fetch client build failure")]
    Build {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The request failed in transport.
    #[error("fetch request failure")]
    Http {
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("fetch response status error")]
    Status {
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// Reading the response body failed mid-stream.
    #[error("fetch stream failure")]
    Stream {
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// IO failures while writing to local disk.
    #[error("fetch io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The fetch was cancelled through the root token.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
