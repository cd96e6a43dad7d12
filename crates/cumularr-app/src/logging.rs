//! Logging initialisation.
//!
//! # Design
//! - One entry point installing the fmt subscriber for the whole process.
//! - `RUST_LOG` overrides the default filter.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

/// Default logging target when `RUST_LOG` is not provided.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configure and install the global tracing subscriber.
pub(crate) fn init() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|source| AppError::Logging {
            source: anyhow!(source),
        })
}
