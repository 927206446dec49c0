//! The calendar tools.

use std::sync::Arc;

use agentcal_core::{parse_timestamp, Time};
use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;
use crate::r#trait::{Tool, ToolInput};

pub mod events;
pub mod filter;
pub mod navigation;
pub mod settings;

pub use events::{CreateEvent, DeleteEvent, GetEvent, ListEvents, UpdateEvent};
pub use filter::{FilterByUser, GetCurrentFilter, ListUsers};
pub use navigation::{GetCurrentView, GoToToday, NavigateToDate, SwitchView};
pub use settings::{GetSettings, SetBadgeVariant, SetVisibleHours, SetWorkingHours};

/// One instance of every calendar tool, events first.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ListEvents::new()),
        Arc::new(GetEvent::new()),
        Arc::new(CreateEvent::new()),
        Arc::new(UpdateEvent::new()),
        Arc::new(DeleteEvent::new()),
        Arc::new(ListUsers::new()),
        Arc::new(FilterByUser::new()),
        Arc::new(GetCurrentFilter::new()),
        Arc::new(SwitchView::new()),
        Arc::new(GetCurrentView::new()),
        Arc::new(NavigateToDate::new()),
        Arc::new(GoToToday::new()),
        Arc::new(GetSettings::new()),
        Arc::new(SetBadgeVariant::new()),
        Arc::new(SetVisibleHours::new()),
        Arc::new(SetWorkingHours::new()),
    ]
}

/// Turn validated input into the handler's typed input.
pub(crate) fn decode<T: DeserializeOwned>(input: &ToolInput) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(input.clone()))
        .map_err(|e| ToolError::invalid(format!("Invalid input: {}", e)))
}

pub(crate) fn parse_time(field: &str, value: &str) -> Result<Time, ToolError> {
    parse_timestamp(value).map_err(|e| ToolError::invalid(format!("{}: {}", field, e)))
}

pub(crate) fn parse_optional_time(field: &str, value: Option<&str>) -> Result<Option<Time>, ToolError> {
    value.map(|v| parse_time(field, v)).transpose()
}

/// `2025-01-15T09:00:00.000Z`
pub(crate) fn iso(time: Time) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
