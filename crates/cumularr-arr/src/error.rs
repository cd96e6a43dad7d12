//! Error types for Arr history queries.

use thiserror::Error;

/// Result alias for Arr client operations.
pub type ArrResult<T> = Result<T, ArrError>;

/// Errors produced by the Arr history client.
#[derive(Debug, Error)]
pub enum ArrError {
    /// The API key could not be encoded as a request header.
    #[error("arr credential invalid")]
    Credential,
    /// The HTTP client could not be constructed.
    #[error("arr client build failure")]
    Build {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The base URL could not be parsed or extended.
    #[error("arr endpoint construction failure")]
    Endpoint {
        /// Base URL provided in the configuration.
        url: String,
    },
    /// The request failed in transport.
    #[error("arr request failure")]
    Http {
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("arr response status error")]
    Status {
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The response body could not be decoded.
    #[error("arr response decode failure")]
    Decode {
        /// URL used for the request.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
}

impl ArrError {
    /// Whether the failure is a plain reachability problem rather than a
    /// server-side rejection.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_connect() || source.is_timeout(),
            _ => false,
        }
    }
}
