//! View switching and date navigation.

use agentcal_core::{parse_timestamp, CalendarView, Time};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{decode, iso};
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::r#trait::*;

/// Switch the calendar to another view.
pub struct SwitchView {
    schema: ToolSchema,
}

#[derive(Deserialize)]
struct SwitchViewInput {
    view: String,
}

impl SwitchView {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_switch_view",
            "Switch to a different calendar view (day, week, month, year, or agenda)",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "view",
            ParamType::one_of(&CalendarView::NAMES),
            "The calendar view to switch to",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for SwitchView {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: SwitchViewInput = decode(input)?;
        let view: CalendarView = input.view.parse().map_err(ToolError::invalid)?;

        info!("Navigating to {}", view.route());
        ctx.display.modify(|s| s.route = view.route().to_string());
        Ok(json!({
            "success": true,
            "message": format!("Switched to {} view", view),
            "currentView": view,
        }))
    }
}

/// Report the current view and selected date.
pub struct GetCurrentView {
    schema: ToolSchema,
}

impl GetCurrentView {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new(
                "calendar_get_current_view",
                "Get the current calendar view being displayed",
                ToolAnnotations::READ_ONLY,
            ),
        }
    }
}

#[async_trait]
impl Tool for GetCurrentView {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, _input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let display = ctx.display.snapshot();
        Ok(json!({
            "currentView": display.current_view(),
            "selectedDate": iso(display.selected_date),
        }))
    }
}

/// Move the calendar to a given date.
pub struct NavigateToDate {
    schema: ToolSchema,
}

#[derive(Deserialize)]
struct NavigateInput {
    date: String,
}

impl NavigateToDate {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_navigate_to_date",
            "Navigate the calendar to a specific date",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "date",
            ParamType::string(),
            "ISO date string like '2025-01-15' or '2025-01-15T09:00:00Z'",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for NavigateToDate {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: NavigateInput = decode(input)?;
        let date = parse_timestamp(&input.date).map_err(|_| ToolError::invalid("Invalid date format"))?;
        Ok(select_date(ctx, date, format!("Navigated to {}", date.format("%a %b %d %Y"))))
    }
}

/// Move the calendar to today.
pub struct GoToToday {
    schema: ToolSchema,
}

impl GoToToday {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new(
                "calendar_go_to_today",
                "Navigate the calendar to today's date",
                ToolAnnotations::IDEMPOTENT,
            ),
        }
    }
}

#[async_trait]
impl Tool for GoToToday {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, _input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let today = ctx.clock.now();
        Ok(select_date(ctx, today, "Navigated to today".to_string()))
    }
}

fn select_date(ctx: &ToolContext, date: Time, message: String) -> ToolOutput {
    ctx.display.modify(|s| s.selected_date = date);
    json!({
        "success": true,
        "message": message,
        "selectedDate": iso(date),
    })
}
