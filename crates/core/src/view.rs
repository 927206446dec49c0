//! Calendar views and the user filter.

use crate::id::UserId;
use serde::{Deserialize, Serialize};

/// A calendar layout, each reachable through its own route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    /// One day, hour by hour
    Day,
    /// Seven days side by side
    Week,
    /// Month grid, the default
    #[default]
    Month,
    /// Twelve small month grids
    Year,
    /// Flat list of upcoming events
    Agenda,
}

impl CalendarView {
    /// Wire names of the views.
    pub const NAMES: [&'static str; 5] = ["day", "week", "month", "year", "agenda"];

    /// Wire name of this view.
    pub fn as_str(self) -> &'static str {
        match self {
            CalendarView::Day => "day",
            CalendarView::Week => "week",
            CalendarView::Month => "month",
            CalendarView::Year => "year",
            CalendarView::Agenda => "agenda",
        }
    }

    /// Route that renders this view.
    pub fn route(self) -> &'static str {
        match self {
            CalendarView::Day => "/day-view",
            CalendarView::Week => "/week-view",
            CalendarView::Month => "/month-view",
            CalendarView::Year => "/year-view",
            CalendarView::Agenda => "/agenda-view",
        }
    }

    /// Infer the view from a route path such as `/week-view`.
    ///
    /// Returns `None` for paths that do not name a view.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.trim_start_matches('/').trim_end_matches("-view");
        name.parse().ok()
    }
}

impl std::str::FromStr for CalendarView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(CalendarView::Day),
            "week" => Ok(CalendarView::Week),
            "month" => Ok(CalendarView::Month),
            "year" => Ok(CalendarView::Year),
            "agenda" => Ok(CalendarView::Agenda),
            other => Err(format!("unknown calendar view: {other}")),
        }
    }
}

impl std::fmt::Display for CalendarView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which user's events are shown. Serialized as `"all"` or the user id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserFilter {
    /// No filtering
    #[default]
    All,
    /// Only this user's events
    User(UserId),
}

impl UserFilter {
    /// Sentinel that selects every user.
    pub const ALL: &'static str = "all";

    /// Whether a specific user is selected.
    pub fn is_filtering(&self) -> bool {
        matches!(self, UserFilter::User(_))
    }

    /// The selected user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            UserFilter::All => None,
            UserFilter::User(id) => Some(id),
        }
    }

    /// Wire form of the filter.
    pub fn as_str(&self) -> &str {
        match self {
            UserFilter::All => Self::ALL,
            UserFilter::User(id) => id.as_str(),
        }
    }
}

impl From<String> for UserFilter {
    fn from(value: String) -> Self {
        if value == Self::ALL {
            UserFilter::All
        } else {
            UserFilter::User(UserId(value))
        }
    }
}

impl From<UserFilter> for String {
    fn from(filter: UserFilter) -> Self {
        filter.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_round_trip() {
        for name in CalendarView::NAMES {
            let view: CalendarView = name.parse().unwrap();
            assert_eq!(CalendarView::from_path(view.route()), Some(view));
        }
    }

    #[test]
    fn test_from_path_rejects_unknown_routes() {
        assert_eq!(CalendarView::from_path("/"), None);
        assert_eq!(CalendarView::from_path("/settings"), None);
    }

    #[test]
    fn test_user_filter_wire_form() {
        assert_eq!(serde_json::to_value(UserFilter::All).unwrap(), "all");
        let filter: UserFilter = serde_json::from_value(serde_json::json!("2")).unwrap();
        assert_eq!(filter, UserFilter::User(UserId::new("2")));
        assert!(filter.is_filtering());
    }
}
