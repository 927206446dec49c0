//! Append-only activity ledger.

use std::sync::{PoisonError, RwLock};

use agentcal_core::Time;
use tokio::sync::broadcast;
use tracing::debug;

use crate::entry::{ActivityEntry, ActivityKind, NewActivity};

/// How long an entry counts as "recent" for the activity pulse.
pub const RECENT_ACTIVITY_WINDOW: std::time::Duration = std::time::Duration::from_secs(5);

const SUBSCRIBER_CAPACITY: usize = 256;

/// Ordered record of everything agents and the user did.
///
/// Entries are kept in recording order and never edited. The only way to
/// remove them is [`ActivityLedger::clear`].
pub struct ActivityLedger {
    entries: RwLock<Vec<ActivityEntry>>,
    notify: broadcast::Sender<ActivityEntry>,
}

impl ActivityLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            entries: RwLock::new(Vec::new()),
            notify,
        }
    }

    /// Append an entry, assigning id and timestamp when absent.
    pub fn record(&self, activity: NewActivity) -> ActivityEntry {
        let entry = activity.into_entry(chrono::Utc::now());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        debug!(
            kind = ?entry.kind,
            agent = entry.agent_name.as_deref().unwrap_or("user"),
            status = %entry.status,
            "{}",
            entry.description
        );
        // No subscribers is fine.
        let _ = self.notify.send(entry.clone());
        entry
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the ledger holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Entries attributed to `agent`, oldest first.
    pub fn by_agent(&self, agent: &str) -> Vec<ActivityEntry> {
        self.read()
            .iter()
            .filter(|e| e.agent_name.as_deref() == Some(agent))
            .cloned()
            .collect()
    }

    /// Entries of one kind, oldest first.
    pub fn of_kind(&self, kind: ActivityKind) -> Vec<ActivityEntry> {
        self.read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Entries recorded within `window` before `now`.
    pub fn recent(&self, window: std::time::Duration, now: Time) -> Vec<ActivityEntry> {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        self.read()
            .iter()
            .filter(|e| now.signed_duration_since(e.timestamp) < window)
            .cloned()
            .collect()
    }

    /// Whether anything was recorded within `window` before `now`.
    pub fn has_recent(&self, window: std::time::Duration, now: Time) -> bool {
        !self.recent(window, now).is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Clearing {} activity entries", entries.len());
        entries.clear();
    }

    /// Receive entries as they are recorded.
    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEntry> {
        self.notify.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<ActivityEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityLedger {
    fn default() -> Self {
        Self::new()
    }
}
