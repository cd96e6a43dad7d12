//! Wire-level entities returned by the remote cloud service.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::transfer::TransferStatus;

/// Account details for the configured credential.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    /// Account username.
    pub username: String,
    /// Contact address registered with the account.
    #[serde(default)]
    pub mail: Option<String>,
}

/// A transfer entity as reported by the remote service.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTransfer {
    /// Remote transfer identifier.
    pub id: u64,
    /// BitTorrent infohash, when known.
    #[serde(default)]
    pub hash: Option<String>,
    /// Human-readable label.
    #[serde(default)]
    pub name: Option<String>,
    /// Total payload size in bytes.
    #[serde(default)]
    pub size: Option<i64>,
    /// Bytes downloaded on the remote side.
    #[serde(default)]
    pub downloaded: Option<i64>,
    /// Remote ETA in seconds.
    #[serde(default)]
    pub estimated_time: Option<i64>,
    /// Raw status string; compare through [`RemoteTransfer::status_kind`].
    pub status: String,
    /// When the remote download started.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// When the remote download finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Root of the transfer's remote file tree; absent until the transfer
    /// has produced files.
    #[serde(default)]
    pub file_id: Option<i64>,
    /// Folder the transfer was saved under.
    #[serde(default)]
    pub save_parent_id: Option<i64>,
    /// Source tag recorded when the transfer was submitted.
    #[serde(default)]
    pub source: Option<String>,
    /// Whether the remote file tree still exists.
    #[serde(default)]
    pub userfile_exists: bool,
    /// Failure detail reported by the remote service.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl RemoteTransfer {
    /// Parse the raw status string, case-insensitively.
    #[must_use]
    pub fn status_kind(&self) -> TransferStatus {
        TransferStatus::parse(&self.status)
    }

    /// Whether the transfer has a file tree to download from.
    #[must_use]
    pub const fn is_downloadable(&self) -> bool {
        self.file_id.is_some()
    }
}

/// A file or folder node in the remote file tree.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    /// Remote file identifier.
    pub id: i64,
    /// File or folder name.
    pub name: String,
    /// MIME content type reported by the remote service.
    #[serde(default)]
    pub content_type: String,
    /// Remote type discriminator (`FOLDER`, `VIDEO`, ...).
    #[serde(default)]
    pub file_type: String,
}

impl RemoteFile {
    /// Whether this node is a folder, compared case-insensitively.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("FOLDER")
    }

    /// Whether this node is a video file, compared case-insensitively.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("VIDEO")
    }
}

/// A folder listing: the folder itself plus its direct children.
#[derive(Debug, Clone, Deserialize)]
pub struct FileListing {
    /// The listed folder.
    pub parent: RemoteFile,
    /// Direct children of the folder, in remote listing order.
    pub files: Vec<RemoteFile>,
}
