//! In-memory snapshot storage, for tests and ephemeral runs.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CalendarData, Revision, SnapshotStorage, StorageError, Result};

/// Keeps every revision in memory.
#[derive(Default)]
pub struct MemoryStorage {
    revisions: Mutex<Vec<(Revision, CalendarData)>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn push_revision(
    revisions: &mut Vec<(Revision, CalendarData)>,
    data: &CalendarData,
    message: &str,
) -> Revision {
    let revision = Revision {
        version: revisions.len() as u64 + 1,
        message: message.to_string(),
        saved_at: chrono::Utc::now(),
        event_count: data.events.len(),
    };
    revisions.push((revision.clone(), data.clone()));
    revision
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<CalendarData>> {
        Ok(self.revisions.lock().await.last().map(|(_, d)| d.clone()))
    }

    async fn save(&self, data: &CalendarData, message: &str) -> Result<Revision> {
        let mut revisions = self.revisions.lock().await;
        Ok(push_revision(&mut revisions, data, message))
    }

    async fn history(&self) -> Result<Vec<Revision>> {
        Ok(self
            .revisions
            .lock()
            .await
            .iter()
            .map(|(r, _)| r.clone())
            .collect())
    }

    async fn rollback(&self, version: u64) -> Result<CalendarData> {
        let mut revisions = self.revisions.lock().await;
        let data = revisions
            .iter()
            .find(|(r, _)| r.version == version)
            .map(|(_, d)| d.clone())
            .ok_or_else(|| StorageError::NotFound(format!("revision {}", version)))?;
        push_revision(&mut revisions, &data, &format!("Rollback to revision {}", version));
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcal_core::User;

    #[tokio::test]
    async fn test_rollback_appends_revision() {
        let storage = MemoryStorage::new();
        let empty = CalendarData::default();
        let with_user = CalendarData::new(vec![], vec![User::new("1", "Ann")]);

        storage.save(&empty, "empty").await.unwrap();
        storage.save(&with_user, "user").await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(with_user));

        assert_eq!(storage.rollback(1).await.unwrap(), empty);
        assert_eq!(storage.history().await.unwrap().len(), 3);
        assert_eq!(storage.load().await.unwrap(), Some(empty));
    }
}
