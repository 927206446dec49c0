//! agentcal core data models.
//!
//! This crate defines the calendar data shared by agents and the human user:
//! events, users, display settings and calendar views.

#![warn(missing_docs)]

// Core identities
mod id;

// Calendar data
mod event;
mod user;

// Display state
mod settings;
mod view;

// Timestamp parsing
mod time;

// Re-exports
pub use id::{EventId, UserId};

pub use event::{Event, EventColor, ParseColorError};
pub use user::User;

pub use settings::{
    BadgeVariant, DaySchedule, DisplaySettings, VisibleHours, WorkingHours, DAY_NAMES,
};
pub use view::{CalendarView, UserFilter};

pub use time::{parse_timestamp, TimestampError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
