//! Display settings tools.

use agentcal_core::{BadgeVariant, DaySchedule, VisibleHours, DAY_NAMES};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::decode;
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::r#trait::*;

/// Report badge variant, visible hours and working hours.
pub struct GetSettings {
    schema: ToolSchema,
}

impl GetSettings {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new(
                "calendar_get_settings",
                "Get current calendar display settings including badge variant, visible hours, and working hours",
                ToolAnnotations::READ_ONLY,
            ),
        }
    }
}

#[async_trait]
impl Tool for GetSettings {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, _input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        serde_json::to_value(&ctx.display.snapshot().settings)
            .map_err(|e| ToolError::Internal(e.to_string()))
    }
}

/// Change how event badges are drawn.
pub struct SetBadgeVariant {
    schema: ToolSchema,
}

#[derive(Deserialize)]
struct BadgeInput {
    variant: String,
}

impl SetBadgeVariant {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_set_badge_variant",
            "Change how event badges are displayed in the calendar (dot, colored, or mixed)",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "variant",
            ParamType::one_of(&BadgeVariant::NAMES),
            "Badge display style: 'dot' shows small dots, 'colored' shows full colored badges, 'mixed' combines both",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for SetBadgeVariant {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: BadgeInput = decode(input)?;
        let variant: BadgeVariant = input.variant.parse().map_err(ToolError::invalid)?;

        ctx.display.modify(|s| s.settings.badge_variant = variant);
        info!("Badge variant set to {}", variant.as_str());
        Ok(json!({
            "success": true,
            "message": format!("Badge variant changed to \"{}\"", variant.as_str()),
            "currentVariant": variant,
        }))
    }
}

/// Set the hour range shown in day and week views.
pub struct SetVisibleHours {
    schema: ToolSchema,
}

#[derive(Deserialize)]
struct HoursInput {
    from: u8,
    to: u8,
}

impl SetVisibleHours {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_set_visible_hours",
            "Set the range of hours visible in day and week views",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required("from", ParamType::integer(0, 23), "Start hour (0-23)"))
        .param(Parameter::required("to", ParamType::integer(1, 24), "End hour (1-24)"));
        Self { schema }
    }
}

#[async_trait]
impl Tool for SetVisibleHours {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let HoursInput { from, to } = decode(input)?;
        let hours = VisibleHours::new(from, to)
            .ok_or_else(|| ToolError::invalid("Start hour must be before end hour"))?;

        ctx.display.modify(|s| s.settings.visible_hours = hours);
        Ok(json!({
            "success": true,
            "message": format!("Visible hours set to {}:00 - {}:00", from, to),
            "visibleHours": hours,
        }))
    }
}

/// Set the working hours of one weekday.
pub struct SetWorkingHours {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkingHoursInput {
    day_of_week: u8,
    from: u8,
    to: u8,
}

impl SetWorkingHours {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_set_working_hours",
            "Set working hours for a specific day of the week (affects visual styling in week/day views)",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "dayOfWeek",
            ParamType::integer(0, 6),
            "Day of week (0=Sunday, 1=Monday, ..., 6=Saturday)",
        ))
        .param(Parameter::required(
            "from",
            ParamType::integer(0, 23),
            "Work start hour (0-23), or 0 if not a working day",
        ))
        .param(Parameter::required(
            "to",
            ParamType::integer(0, 24),
            "Work end hour (0-24), or 0 if not a working day",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for SetWorkingHours {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let WorkingHoursInput { day_of_week, from, to } = decode(input)?;
        let day_name = DAY_NAMES
            .get(day_of_week as usize)
            .copied()
            .ok_or_else(|| ToolError::invalid(format!("No such day of week: {}", day_of_week)))?;
        let schedule = DaySchedule::new(from, to);

        ctx.display.modify(|s| {
            s.settings.working_hours = s.settings.working_hours.with_day(day_of_week, schedule)
        });

        let message = if schedule.is_working_day() {
            format!("Working hours for {} set to {}:00 - {}:00", day_name, from, to)
        } else {
            format!("{} marked as non-working day", day_name)
        };
        Ok(json!({
            "success": true,
            "message": message,
            "dayOfWeek": day_of_week,
            "dayName": day_name,
            "workingHours": schedule,
            "isWorkingDay": schedule.is_working_day(),
        }))
    }
}
