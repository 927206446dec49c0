//! Event model - entries on the calendar.

use crate::id::EventId;
use crate::user::User;
use crate::Time;
use serde::{Deserialize, Serialize};

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier
    pub id: EventId,

    /// Title, never empty
    pub title: String,

    /// Free-form description
    pub description: String,

    /// When the event starts
    pub start_date: Time,

    /// When the event ends
    pub end_date: Time,

    /// Badge color
    pub color: EventColor,

    /// User responsible for this event
    pub user: User,
}

impl Event {
    /// Create a new event.
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        description: impl Into<String>,
        start_date: Time,
        end_date: Time,
        color: EventColor,
        user: User,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            start_date,
            end_date,
            color,
            user,
        }
    }

    /// Whether the event ends at or after `instant`.
    pub fn ends_on_or_after(&self, instant: Time) -> bool {
        self.end_date >= instant
    }

    /// Whether the event starts at or before `instant`.
    pub fn starts_on_or_before(&self, instant: Time) -> bool {
        self.start_date <= instant
    }

    /// Whether the start/end pair is ordered.
    pub fn is_well_ordered(&self) -> bool {
        self.start_date <= self.end_date
    }
}

/// The fixed event color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    /// `blue`
    Blue,
    /// `green`
    Green,
    /// `red`
    Red,
    /// `yellow`
    Yellow,
    /// `purple`
    Purple,
    /// `orange`
    Orange,
    /// `gray`
    Gray,
}

impl EventColor {
    /// Every palette color, in display order.
    pub const ALL: [EventColor; 7] = [
        EventColor::Blue,
        EventColor::Green,
        EventColor::Red,
        EventColor::Yellow,
        EventColor::Purple,
        EventColor::Orange,
        EventColor::Gray,
    ];

    /// Wire names of the palette, in display order.
    pub const NAMES: [&'static str; 7] = ["blue", "green", "red", "yellow", "purple", "orange", "gray"];

    /// Wire name of this color.
    pub fn as_str(self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Green => "green",
            EventColor::Red => "red",
            EventColor::Yellow => "yellow",
            EventColor::Purple => "purple",
            EventColor::Orange => "orange",
            EventColor::Gray => "gray",
        }
    }
}

impl std::fmt::Display for EventColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A color name outside the palette.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event color: {0}")]
pub struct ParseColorError(pub String);

impl std::str::FromStr for EventColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}
