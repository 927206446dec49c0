//! Event Store - the shared events and users of one calendar view.

use agentcal_core::{Event, EventId, User};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cell::SnapshotCell;

/// The two documents that make up the calendar: an event array and a user array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarData {
    /// Events, in insertion order
    pub events: Vec<Event>,

    /// Users events can be assigned to
    pub users: Vec<User>,
}

impl CalendarData {
    /// Create data from its two documents.
    pub fn new(events: Vec<Event>, users: Vec<User>) -> Self {
        Self { events, users }
    }

    /// Find an event by id.
    pub fn find_event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Find a user by id.
    pub fn find_user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id.as_str() == id)
    }

    /// `Name (id)` list of every user, for error messages.
    pub fn user_labels(&self) -> String {
        self.users
            .iter()
            .map(User::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Id for an event generated at `now_ms`.
    ///
    /// The timestamp is bumped past the largest existing id when it would
    /// collide, so ids stay unique for events created in the same millisecond.
    pub fn next_event_id(&self, now_ms: u64) -> EventId {
        let candidate = EventId::new(now_ms);
        match self.events.iter().map(|e| e.id).max() {
            Some(max) if max >= candidate => max.next(),
            _ => candidate,
        }
    }

    /// Copy with `event` appended.
    pub fn with_event_added(&self, event: Event) -> Self {
        let mut events = self.events.clone();
        events.push(event);
        Self {
            events,
            users: self.users.clone(),
        }
    }

    /// Copy with the event of the same id replaced.
    pub fn with_event_replaced(&self, event: Event) -> Self {
        let events = self
            .events
            .iter()
            .map(|e| if e.id == event.id { event.clone() } else { e.clone() })
            .collect();
        Self {
            events,
            users: self.users.clone(),
        }
    }

    /// Copy without the event `id`.
    pub fn with_event_removed(&self, id: EventId) -> Self {
        Self {
            events: self.events.iter().filter(|e| e.id != id).cloned().collect(),
            users: self.users.clone(),
        }
    }
}

/// Shared, snapshot-replaced calendar state.
///
/// Every write installs a complete new [`CalendarData`]; concurrent readers
/// see either the previous or the next snapshot.
pub struct EventStore {
    data: SnapshotCell<CalendarData>,
    version: AtomicU64,
}

impl EventStore {
    /// Create a store holding `data`.
    pub fn new(data: CalendarData) -> Self {
        Self {
            data: SnapshotCell::new(data),
            version: AtomicU64::new(0),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<CalendarData> {
        self.data.load()
    }

    /// Replace both documents wholesale.
    pub fn replace(&self, data: CalendarData) {
        self.data.store(data);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Read-compute-replace; the store is untouched when `f` fails.
    pub fn update<R, E>(
        &self,
        f: impl FnOnce(&CalendarData) -> Result<(CalendarData, R), E>,
    ) -> Result<R, E> {
        let out = self.data.update(f)?;
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(out)
    }

    /// A new independent store starting from the current snapshot.
    pub fn fork(&self) -> EventStore {
        EventStore::new((*self.snapshot()).clone())
    }

    /// Number of writes installed so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Number of events in the current snapshot.
    pub fn event_count(&self) -> usize {
        self.snapshot().events.len()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(CalendarData::default())
    }
}
