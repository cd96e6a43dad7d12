//! # Design
//!
//! - Constant messages with identifier context; no task boundary lets one
//!   of these abort the engine.
//! - Planning failures are typed so the orchestration worker can log and
//!   drop a transfer without unwrapping error chains.

use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the orchestration engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A transfer was planned before its remote file tree existed.
    #[error("transfer has no file tree to plan")]
    MissingFileId {
        /// Transfer that could not be planned.
        transfer_id: u64,
    },
    /// The transfer was saved outside the configured instance folder.
    #[error("plan root outside the instance folder")]
    FolderMismatch {
        /// Transfer that was rejected.
        transfer_id: u64,
        /// Configured instance folder id.
        expected: i64,
        /// Folder the transfer was actually saved under.
        actual: i64,
    },
    /// A remote call made on behalf of the planner failed.
    #[error("remote listing failure")]
    Remote {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying client error.
        #[source]
        source: anyhow::Error,
    },
    /// A bounded channel closed while the engine was still running.
    #[error("engine channel closed")]
    ChannelClosed {
        /// Channel name for diagnostics.
        channel: &'static str,
    },
    /// A transfer reached a watcher without a persisted plan.
    #[error("transfer plan missing")]
    PlanMissing {
        /// Transfer whose plan was expected.
        transfer_id: u64,
    },
}
