//! Event tools: list, get, create, update, delete.

use agentcal_core::{Event, EventColor, EventId};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{decode, parse_optional_time, parse_time};
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::r#trait::*;

fn event_not_found(id: u64) -> ToolError {
    ToolError::NotFound(format!("Event with ID {} not found", id))
}

fn color_param() -> ParamType {
    ParamType::one_of(&EventColor::NAMES)
}

/// List events, optionally filtered by date range or user.
pub struct ListEvents {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsInput {
    start_date: Option<String>,
    end_date: Option<String>,
    user_id: Option<String>,
}

impl ListEvents {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_list_events",
            "List all calendar events, optionally filtered by date range or user",
            ToolAnnotations::READ_ONLY,
        )
        .param(Parameter::optional(
            "startDate",
            ParamType::Timestamp,
            "Filter events starting from this date (ISO format)",
        ))
        .param(Parameter::optional(
            "endDate",
            ParamType::Timestamp,
            "Filter events ending before this date (ISO format)",
        ))
        .param(Parameter::optional("userId", ParamType::string(), "Filter events by user ID"));
        Self { schema }
    }
}

#[async_trait]
impl Tool for ListEvents {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: ListEventsInput = decode(input)?;
        let start = parse_optional_time("startDate", input.start_date.as_deref())?;
        let end = parse_optional_time("endDate", input.end_date.as_deref())?;

        let data = ctx.store.snapshot();
        let events: Vec<_> = data
            .events
            .iter()
            .filter(|e| start.map_or(true, |s| e.ends_on_or_after(s)))
            .filter(|e| end.map_or(true, |t| e.starts_on_or_before(t)))
            .filter(|e| {
                input
                    .user_id
                    .as_deref()
                    .map_or(true, |u| e.user.id.as_str() == u)
            })
            .map(|e| {
                json!({
                    "id": e.id,
                    "title": e.title,
                    "startDate": e.start_date,
                    "endDate": e.end_date,
                    "color": e.color,
                    "user": e.user.name,
                    "description": e.description,
                })
            })
            .collect();

        let count = events.len();
        Ok(json!({ "events": events, "count": count }))
    }
}

/// Get one event by id.
pub struct GetEvent {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventIdInput {
    event_id: u64,
}

impl GetEvent {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_get_event",
            "Get detailed information about a specific event by ID",
            ToolAnnotations::READ_ONLY,
        )
        .param(Parameter::required(
            "eventId",
            ParamType::integer_from(0),
            "The ID of the event to retrieve",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for GetEvent {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: EventIdInput = decode(input)?;
        let data = ctx.store.snapshot();
        let event = data
            .find_event(EventId::new(input.event_id))
            .ok_or_else(|| event_not_found(input.event_id))?;
        Ok(json!({ "event": event }))
    }
}

/// Create an event owned by an existing user.
pub struct CreateEvent {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventInput {
    title: String,
    description: String,
    start_date: String,
    end_date: String,
    color: EventColor,
    user_id: String,
}

impl CreateEvent {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_create_event",
            "Create a new calendar event",
            ToolAnnotations::WRITE,
        )
        .param(Parameter::required("title", ParamType::non_empty_string(), "Event title"))
        .param(Parameter::required("description", ParamType::string(), "Event description"))
        .param(Parameter::required(
            "startDate",
            ParamType::Timestamp,
            "Start date and time in ISO format",
        ))
        .param(Parameter::required(
            "endDate",
            ParamType::Timestamp,
            "End date and time in ISO format",
        ))
        .param(Parameter::required("color", color_param(), "Event color"))
        .param(Parameter::required(
            "userId",
            ParamType::string(),
            "ID of the user responsible for this event",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for CreateEvent {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: CreateEventInput = decode(input)?;
        let start = parse_time("startDate", &input.start_date)?;
        let end = parse_time("endDate", &input.end_date)?;
        if end < start {
            warn!("Event \"{}\" ends before it starts", input.title);
        }
        let now_ms = ctx.clock.now().timestamp_millis().max(0) as u64;

        let event = ctx.store.update(|data| {
            let user = data.find_user(&input.user_id).cloned().ok_or_else(|| {
                ToolError::NotFound(format!(
                    "User with ID {} not found. Available users: {}",
                    input.user_id,
                    data.user_labels()
                ))
            })?;
            let event = Event::new(
                data.next_event_id(now_ms),
                input.title,
                input.description,
                start,
                end,
                input.color,
                user,
            );
            Ok::<_, ToolError>((data.with_event_added(event.clone()), event))
        })?;

        info!("Created event {} \"{}\"", event.id, event.title);
        Ok(json!({
            "success": true,
            "message": format!("Event \"{}\" created successfully", event.title),
            "event": event,
        }))
    }
}

/// Update fields of an existing event.
pub struct UpdateEvent {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEventInput {
    event_id: u64,
    title: Option<String>,
    description: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    color: Option<EventColor>,
    user_id: Option<String>,
}

impl UpdateEvent {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_update_event",
            "Update an existing calendar event",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "eventId",
            ParamType::integer_from(0),
            "The ID of the event to update",
        ))
        .param(Parameter::optional("title", ParamType::non_empty_string(), "New event title"))
        .param(Parameter::optional("description", ParamType::string(), "New event description"))
        .param(Parameter::optional(
            "startDate",
            ParamType::Timestamp,
            "New start date and time in ISO format",
        ))
        .param(Parameter::optional(
            "endDate",
            ParamType::Timestamp,
            "New end date and time in ISO format",
        ))
        .param(Parameter::optional("color", color_param(), "New event color"))
        .param(Parameter::optional("userId", ParamType::string(), "New user ID"));
        Self { schema }
    }
}

#[async_trait]
impl Tool for UpdateEvent {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: UpdateEventInput = decode(input)?;
        let start = parse_optional_time("startDate", input.start_date.as_deref())?;
        let end = parse_optional_time("endDate", input.end_date.as_deref())?;

        let event = ctx.store.update(|data| {
            let existing = data
                .find_event(EventId::new(input.event_id))
                .ok_or_else(|| event_not_found(input.event_id))?;

            let mut updated = existing.clone();
            if let Some(user_id) = &input.user_id {
                updated.user = data
                    .find_user(user_id)
                    .cloned()
                    .ok_or_else(|| ToolError::NotFound(format!("User with ID {} not found", user_id)))?;
            }
            if let Some(title) = input.title {
                updated.title = title;
            }
            if let Some(description) = input.description {
                updated.description = description;
            }
            if let Some(start) = start {
                updated.start_date = start;
            }
            if let Some(end) = end {
                updated.end_date = end;
            }
            if let Some(color) = input.color {
                updated.color = color;
            }

            Ok::<_, ToolError>((data.with_event_replaced(updated.clone()), updated))
        })?;

        if !event.is_well_ordered() {
            warn!("Event {} now ends before it starts", event.id);
        }
        info!("Updated event {} \"{}\"", event.id, event.title);
        Ok(json!({
            "success": true,
            "message": format!("Event \"{}\" updated successfully", event.title),
            "event": event,
        }))
    }
}

/// Delete an event by id.
pub struct DeleteEvent {
    schema: ToolSchema,
}

impl DeleteEvent {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_delete_event",
            "Delete a calendar event by ID",
            ToolAnnotations::DESTRUCTIVE,
        )
        .param(Parameter::required(
            "eventId",
            ParamType::integer_from(0),
            "The ID of the event to delete",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for DeleteEvent {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: EventIdInput = decode(input)?;
        let id = EventId::new(input.event_id);

        let deleted = ctx.store.update(|data| {
            let event = data
                .find_event(id)
                .cloned()
                .ok_or_else(|| event_not_found(input.event_id))?;
            Ok::<_, ToolError>((data.with_event_removed(id), event))
        })?;

        info!("Deleted event {} \"{}\"", deleted.id, deleted.title);
        Ok(json!({
            "success": true,
            "message": format!("Event \"{}\" deleted successfully", deleted.title),
            "deletedEventId": id,
            "event": deleted,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::testing::{call, ctx, now};
    use crate::error::ErrorKind;
    use serde_json::Value;
    use std::collections::HashSet;

    fn sync_event() -> Value {
        json!({
            "title": "Sync",
            "description": "",
            "startDate": "2025-01-01T09:00Z",
            "endDate": "2025-01-01T09:30Z",
            "color": "blue",
            "userId": "1",
        })
    }

    #[tokio::test]
    async fn test_create_delete_get_scenario() {
        let ctx = ctx();
        let created = call(&CreateEvent::new(), &ctx, sync_event()).await.unwrap();
        assert_eq!(created["success"], true);
        assert_eq!(created["event"]["user"]["name"], "Ann");
        assert_eq!(created["event"]["id"], json!(now().timestamp_millis()));
        assert_eq!(ctx.store.event_count(), 1);

        let id = created["event"]["id"].clone();
        let deleted = call(&DeleteEvent::new(), &ctx, json!({ "eventId": id })).await.unwrap();
        assert_eq!(deleted["deletedEventId"], id);
        assert_eq!(deleted["event"]["title"], "Sync");
        assert_eq!(ctx.store.event_count(), 0);

        let err = call(&GetEvent::new(), &ctx, json!({ "eventId": id })).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), format!("Event with ID {} not found", id));
    }

    #[tokio::test]
    async fn test_created_ids_are_unique() {
        let ctx = ctx();
        let tool = CreateEvent::new();
        let mut ids = HashSet::new();
        for i in 0..5 {
            let before = ctx.store.event_count();
            let out = call(&tool, &ctx, sync_event()).await.unwrap();
            assert!(ids.insert(out["event"]["id"].as_u64().unwrap()), "duplicate id at {}", i);
            assert_eq!(ctx.store.event_count(), before + 1);
        }
    }

    #[tokio::test]
    async fn test_create_with_unknown_user_lists_users() {
        let ctx = ctx();
        let mut payload = sync_event();
        payload["userId"] = json!("9");
        let err = call(&CreateEvent::new(), &ctx, payload).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "User with ID 9 not found. Available users: Ann (1), Bob (2)"
        );
        assert_eq!(ctx.store.event_count(), 0);
        assert_eq!(ctx.store.version(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_color_and_empty_title() {
        let ctx = ctx();
        let mut payload = sync_event();
        payload["color"] = json!("pink");
        payload["title"] = json!("");
        let err = call(&CreateEvent::new(), &ctx, payload).await.unwrap_err();
        match err {
            ToolError::InvalidInput { violations, .. } => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "color"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_without_fields_is_a_no_op() {
        let ctx = ctx();
        let created = call(&CreateEvent::new(), &ctx, sync_event()).await.unwrap();
        let id = created["event"]["id"].clone();

        let update = UpdateEvent::new();
        let first = call(&update, &ctx, json!({ "eventId": id })).await.unwrap();
        assert_eq!(first["event"], created["event"]);

        let change = json!({ "eventId": id, "title": "Standup", "userId": "2" });
        let a = call(&update, &ctx, change.clone()).await.unwrap();
        let state_a = ctx.store.snapshot();
        let b = call(&update, &ctx, change).await.unwrap();
        assert_eq!(a["event"], b["event"]);
        assert_eq!(*state_a, *ctx.store.snapshot());
        assert_eq!(b["event"]["user"]["name"], "Bob");
        assert_eq!(b["event"]["description"], "");
    }

    #[tokio::test]
    async fn test_update_unknown_event_or_user() {
        let ctx = ctx();
        let update = UpdateEvent::new();
        let err = call(&update, &ctx, json!({ "eventId": 42 })).await.unwrap_err();
        assert_eq!(err.to_string(), "Event with ID 42 not found");

        let created = call(&CreateEvent::new(), &ctx, sync_event()).await.unwrap();
        let id = created["event"]["id"].clone();
        let err = call(&update, &ctx, json!({ "eventId": id, "userId": "7", "title": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User with ID 7 not found");
        let event = call(&GetEvent::new(), &ctx, json!({ "eventId": id })).await.unwrap();
        assert_eq!(event["event"]["title"], "Sync");
    }

    #[tokio::test]
    async fn test_list_filters_by_range_and_user() {
        let ctx = ctx();
        let create = CreateEvent::new();
        call(&create, &ctx, sync_event()).await.unwrap();
        let mut later = sync_event();
        later["title"] = json!("Review");
        later["startDate"] = json!("2025-01-03T10:00:00Z");
        later["endDate"] = json!("2025-01-03T11:00:00Z");
        later["userId"] = json!("2");
        call(&create, &ctx, later).await.unwrap();

        let list = ListEvents::new();
        let all = call(&list, &ctx, Value::Null).await.unwrap();
        assert_eq!(all["count"], 2);
        assert_eq!(all["events"][0]["user"], "Ann");

        let from_jan_2 = call(&list, &ctx, json!({ "startDate": "2025-01-02" })).await.unwrap();
        assert_eq!(from_jan_2["count"], 1);
        assert_eq!(from_jan_2["events"][0]["title"], "Review");

        let until_jan_2 = call(&list, &ctx, json!({ "endDate": "2025-01-02" })).await.unwrap();
        assert_eq!(until_jan_2["count"], 1);
        assert_eq!(until_jan_2["events"][0]["title"], "Sync");

        let bobs = call(&list, &ctx, json!({ "userId": "2" })).await.unwrap();
        assert_eq!(bobs["count"], 1);

        let nobody = call(&list, &ctx, json!({ "userId": "3" })).await.unwrap();
        assert_eq!(nobody["count"], 0);
    }

    #[tokio::test]
    async fn test_unparsable_date_is_invalid_input() {
        let ctx = ctx();
        let err = call(&ListEvents::new(), &ctx, json!({ "startDate": "next tuesday" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
