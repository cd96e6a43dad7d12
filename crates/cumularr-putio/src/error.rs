//! # Design
//!
//! - Constant messages with operation + URL context, mirroring the rest of
//!   the workspace.
//! - Transport, status and decode failures are distinct variants so tests
//!   and logs can tell a refused connection from a server-side rejection.

use thiserror::Error;

/// Result alias for put.io client operations.
pub type PutioResult<T> = Result<T, PutioError>;

/// Errors produced by the put.io REST client.
#[derive(Debug, Error)]
pub enum PutioError {
    /// The OAuth token could not be encoded as a request header.
    #[error("putio credential invalid")]
    Credential,
    /// The HTTP client could not be constructed.
    #[error("putio client build failure")]
    Build {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// An endpoint path could not be joined onto the base URL.
    #[error("putio endpoint construction failure")]
    Endpoint {
        /// Operation that needed the endpoint.
        operation: &'static str,
    },
    /// The request failed in transport.
    #[error("putio request failure")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("putio response status error")]
    Status {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("putio response decode failure")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}
