//! Display state shared by every view of the calendar.
//!
//! Unlike the [`EventStore`](crate::EventStore) this state is never branched:
//! agents and the user all look at the same filter, route, date and settings.

use agentcal_core::{CalendarView, DisplaySettings, Time, UserFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cell::SnapshotCell;

/// One consistent reading of the display state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    /// Which user's events are shown
    pub user_filter: UserFilter,

    /// Current navigation route, e.g. `/week-view`
    pub route: String,

    /// Date the calendar is centred on
    pub selected_date: Time,

    /// Badge, visible-hours and working-hours settings
    pub settings: DisplaySettings,
}

impl DisplaySnapshot {
    /// Initial state centred on `today`.
    pub fn new(today: Time) -> Self {
        Self {
            user_filter: UserFilter::All,
            route: CalendarView::default().route().to_string(),
            selected_date: today,
            settings: DisplaySettings::default(),
        }
    }

    /// View inferred from the route; month when the route names none.
    pub fn current_view(&self) -> CalendarView {
        CalendarView::from_path(&self.route).unwrap_or_default()
    }
}

/// Snapshot-replaced display state.
pub struct DisplayState {
    inner: SnapshotCell<DisplaySnapshot>,
}

impl DisplayState {
    /// Create display state centred on `today`.
    pub fn new(today: Time) -> Self {
        Self {
            inner: SnapshotCell::new(DisplaySnapshot::new(today)),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<DisplaySnapshot> {
        self.inner.load()
    }

    /// Apply a change by building the next snapshot from a copy.
    pub fn modify(&self, f: impl FnOnce(&mut DisplaySnapshot)) {
        let _ = self.inner.update(|current| {
            let mut next = current.clone();
            f(&mut next);
            Ok::<_, std::convert::Infallible>((next, ()))
        });
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(chrono::Utc::now())
    }
}
