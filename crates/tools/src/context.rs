//! State a tool runs against.

use agentcal_core::Time;
use agentcal_storage::{DisplayState, EventStore};
use std::sync::Arc;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Now, in UTC.
    fn now(&self) -> Time;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        chrono::Utc::now()
    }
}

/// Clock stuck at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Time);

impl Clock for FixedClock {
    fn now(&self) -> Time {
        self.0
    }
}

/// The stores and clock handed to a tool for one call.
#[derive(Clone)]
pub struct ToolContext {
    /// Events and users of the target view
    pub store: Arc<EventStore>,

    /// Shared display state
    pub display: Arc<DisplayState>,

    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl ToolContext {
    /// Context using the wall clock.
    pub fn new(store: Arc<EventStore>, display: Arc<DisplayState>) -> Self {
        Self {
            store,
            display,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Same display state and clock, different event store.
    pub fn for_store(&self, store: Arc<EventStore>) -> Self {
        Self {
            store,
            display: self.display.clone(),
            clock: self.clock.clone(),
        }
    }
}
