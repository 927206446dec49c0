//! Display settings for the calendar grid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day names indexed by day of week (0 = Sunday).
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// How event badges are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    /// Small dots
    Dot,
    /// Full colored badges
    #[default]
    Colored,
    /// Both, depending on space
    Mixed,
}

impl BadgeVariant {
    /// Wire names of the variants.
    pub const NAMES: [&'static str; 3] = ["dot", "colored", "mixed"];

    /// Wire name of this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            BadgeVariant::Dot => "dot",
            BadgeVariant::Colored => "colored",
            BadgeVariant::Mixed => "mixed",
        }
    }
}

impl std::str::FromStr for BadgeVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dot" => Ok(BadgeVariant::Dot),
            "colored" => Ok(BadgeVariant::Colored),
            "mixed" => Ok(BadgeVariant::Mixed),
            other => Err(format!("unknown badge variant: {other}")),
        }
    }
}

/// Range of hours shown in day and week views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleHours {
    /// First visible hour (0-23)
    pub from: u8,
    /// Hour the view ends at (1-24)
    pub to: u8,
}

impl VisibleHours {
    /// Build a range, rejecting empty or inverted ones.
    pub fn new(from: u8, to: u8) -> Option<Self> {
        (from < to && to <= 24).then_some(Self { from, to })
    }
}

impl Default for VisibleHours {
    fn default() -> Self {
        Self { from: 7, to: 18 }
    }
}

/// Working hours of a single day. `{0, 0}` marks a non-working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Work start hour
    pub from: u8,
    /// Work end hour
    pub to: u8,
}

impl DaySchedule {
    /// Create a schedule.
    pub fn new(from: u8, to: u8) -> Self {
        Self { from, to }
    }

    /// A day counts as working when either bound is non-zero.
    pub fn is_working_day(&self) -> bool {
        self.from > 0 || self.to > 0
    }
}

/// Working hours per day of week (0 = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingHours(pub BTreeMap<u8, DaySchedule>);

impl WorkingHours {
    /// Schedule for a day, non-working if unset.
    pub fn day(&self, day_of_week: u8) -> DaySchedule {
        self.0.get(&day_of_week).copied().unwrap_or_default()
    }

    /// Copy of these hours with one day replaced.
    pub fn with_day(&self, day_of_week: u8, schedule: DaySchedule) -> Self {
        let mut days = self.0.clone();
        days.insert(day_of_week, schedule);
        Self(days)
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        let mut days = BTreeMap::new();
        days.insert(0, DaySchedule::new(0, 0));
        for weekday in 1..=5 {
            days.insert(weekday, DaySchedule::new(8, 17));
        }
        days.insert(6, DaySchedule::new(8, 12));
        Self(days)
    }
}

/// All display settings together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    /// Badge style
    pub badge_variant: BadgeVariant,
    /// Visible hour range
    pub visible_hours: VisibleHours,
    /// Working hours per weekday
    pub working_hours: WorkingHours,
}
