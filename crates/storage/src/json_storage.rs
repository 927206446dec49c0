//! JSON file storage implementation.
//!
//! Keeps the current `events.json` and `users.json` at the storage root. Each
//! save also archives both documents under `archives/<version>/` and writes a
//! small meta marker (version, updated_at, message) under `meta/`.

use std::path::{Path, PathBuf};
use agentcal_core::{Event, User};
use super::{CalendarData, Revision, SnapshotStorage, StorageError, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

const EVENTS_FILE: &str = "events.json";
const USERS_FILE: &str = "users.json";

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStorage {
    /// Create storage, creating the root and its `archives/` and `meta/`
    /// subdirectories when missing.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("archives")).await?;
        fs::create_dir_all(root.join("meta")).await?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn archive_dir(&self, version: u64) -> PathBuf {
        self.root.join("archives").join(version.to_string())
    }

    fn meta_path(&self, version: u64) -> PathBuf {
        self.root.join("meta").join(format!("{}.meta.json", version))
    }

    async fn latest_version(&self) -> Result<u64> {
        Ok(self.history().await?.last().map(|r| r.version).unwrap_or(0))
    }

    async fn write_revision(&self, data: &CalendarData, message: &str) -> Result<Revision> {
        let version = self.latest_version().await? + 1;

        write_documents(&self.root, data).await?;

        let archive = self.archive_dir(version);
        fs::create_dir_all(&archive).await?;
        write_documents(&archive, data).await?;

        let revision = Revision {
            version,
            message: message.to_string(),
            saved_at: chrono::Utc::now(),
            event_count: data.events.len(),
        };
        let meta = serde_json::to_string_pretty(&revision)?;
        fs::write(self.meta_path(version), meta.as_bytes()).await?;

        debug!("Saved revision {} ({} events): {}", version, data.events.len(), message);
        Ok(revision)
    }
}

#[async_trait::async_trait]
impl SnapshotStorage for JsonStorage {
    async fn load(&self) -> Result<Option<CalendarData>> {
        read_documents(&self.root).await
    }

    async fn save(&self, data: &CalendarData, message: &str) -> Result<Revision> {
        let _guard = self.write_lock.lock().await;
        self.write_revision(data, message).await
    }

    async fn history(&self) -> Result<Vec<Revision>> {
        let mut revisions: Vec<Revision> = Vec::new();
        let mut rd = fs::read_dir(self.root.join("meta")).await?;
        while let Some(entry) = rd.next_entry().await? {
            if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(revision) = read_json(&entry.path()).await? {
                revisions.push(revision);
            }
        }
        revisions.sort_by_key(|r| r.version);
        Ok(revisions)
    }

    async fn rollback(&self, version: u64) -> Result<CalendarData> {
        let _guard = self.write_lock.lock().await;
        let data = read_documents(&self.archive_dir(version))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("revision {}", version)))?;

        self.write_revision(&data, &format!("Rollback to revision {}", version))
            .await?;
        info!("Rolled back {} to revision {}", self.root.display(), version);
        Ok(data)
    }
}

async fn write_documents(dir: &Path, data: &CalendarData) -> Result<()> {
    let events = serde_json::to_string_pretty(&data.events)?;
    let users = serde_json::to_string_pretty(&data.users)?;
    fs::write(dir.join(EVENTS_FILE), events.as_bytes()).await?;
    fs::write(dir.join(USERS_FILE), users.as_bytes()).await?;
    Ok(())
}

async fn read_documents(dir: &Path) -> Result<Option<CalendarData>> {
    let Some(events) = read_json::<Vec<Event>>(&dir.join(EVENTS_FILE)).await? else {
        return Ok(None);
    };
    let users: Vec<User> = read_json(&dir.join(USERS_FILE)).await?.unwrap_or_default();
    Ok(Some(CalendarData::new(events, users)))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
