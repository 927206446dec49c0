//! Snapshot storage trait abstraction.

use agentcal_core::Time;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::store::CalendarData;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A saved version of the calendar documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Monotonic version number, starting at 1
    pub version: u64,

    /// Commit message
    pub message: String,

    /// When it was saved
    pub saved_at: Time,

    /// Number of events in this revision
    pub event_count: usize,
}

/// Versioned storage for the event and user documents.
///
/// Both documents are read and written wholesale. Every save creates a new
/// revision that can be listed and rolled back to.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Load the latest documents, `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<CalendarData>>;

    /// Save both documents as a new revision.
    async fn save(&self, data: &CalendarData, message: &str) -> Result<Revision>;

    /// All revisions, oldest first.
    async fn history(&self) -> Result<Vec<Revision>>;

    /// Restore the documents of `version`, recorded as a new revision.
    async fn rollback(&self, version: u64) -> Result<CalendarData>;
}
