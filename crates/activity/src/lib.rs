//! Activity Ledger
//!
//! Append-only record of every action taken on the calendar, attributed to
//! the agent (or user) that took it.

#![warn(missing_docs)]

pub mod entry;
pub mod ledger;

pub use entry::{ActivityEntry, ActivityId, ActivityKind, ActivityStatus, NewActivity};
pub use ledger::{ActivityLedger, RECENT_ACTIVITY_WINDOW};
