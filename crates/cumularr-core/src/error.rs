//! # Design
//!
//! - Capability traits report failures as `anyhow::Error`; the engine logs
//!   and survives them uniformly.
//! - Import-history probes are the one typed exception: the engine logs an
//!   unreachable service at debug and a failed query at warning, so the
//!   probe error carries that distinction across the trait boundary.

use thiserror::Error;

/// Failure of one import-history probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The service could not be reached at all (connection refused, open
    /// circuit). Expected while an Arr service restarts; logged at debug.
    #[error("history service unreachable")]
    Unreachable {
        /// Service label for attribution.
        service: String,
        /// Underlying transport error.
        #[source]
        source: anyhow::Error,
    },
    /// The service answered but the query failed; logged at warning.
    #[error("history query failed")]
    Query {
        /// Service label for attribution.
        service: String,
        /// Underlying query error.
        #[source]
        source: anyhow::Error,
    },
}

impl ProbeError {
    /// Service label the probe was addressed to.
    #[must_use]
    pub fn service(&self) -> &str {
        match self {
            Self::Unreachable { service, .. } | Self::Query { service, .. } => service,
        }
    }

    /// Whether the failure is a plain reachability problem.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
