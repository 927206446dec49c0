//! Shared calendar state and its persisted snapshots.
//!
//! The in-memory stores publish immutable snapshots that writers replace
//! wholesale. The [`SnapshotStorage`] trait is the boundary to the versioned
//! document store, with a JSON file reference implementation.

#![warn(missing_docs)]

mod cell;
pub mod store;
pub mod display;
pub mod trait_;
pub mod json_storage;
pub mod memory;
pub mod seed;

pub use cell::SnapshotCell;
pub use store::{CalendarData, EventStore};
pub use display::{DisplaySnapshot, DisplayState};
pub use trait_::{Revision, SnapshotStorage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
