//! User listing and the user filter.

use agentcal_core::UserFilter;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::decode;
use crate::context::ToolContext;
use crate::error::ToolError;
use crate::r#trait::*;

/// List users available for filtering.
pub struct ListUsers {
    schema: ToolSchema,
}

impl ListUsers {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new(
                "calendar_list_users",
                "List all users available for filtering events",
                ToolAnnotations::READ_ONLY,
            ),
        }
    }
}

#[async_trait]
impl Tool for ListUsers {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, _input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let data = ctx.store.snapshot();
        let users: Vec<_> = data
            .users
            .iter()
            .map(|u| json!({ "id": u.id, "name": u.name, "hasPicture": u.has_picture() }))
            .collect();
        Ok(json!({
            "users": users,
            "count": users.len(),
            "currentFilter": ctx.display.snapshot().user_filter,
        }))
    }
}

/// Show only one user's events, or everyone's.
pub struct FilterByUser {
    schema: ToolSchema,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterInput {
    user_id: String,
}

impl FilterByUser {
    /// Create the tool.
    pub fn new() -> Self {
        let schema = ToolSchema::new(
            "calendar_filter_by_user",
            "Filter calendar events to show only events for a specific user, or show all users",
            ToolAnnotations::IDEMPOTENT,
        )
        .param(Parameter::required(
            "userId",
            ParamType::string(),
            "User ID to filter by, or 'all' to show all users",
        ));
        Self { schema }
    }
}

#[async_trait]
impl Tool for FilterByUser {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let input: FilterInput = decode(input)?;
        let filter = UserFilter::from(input.user_id);

        let message = match filter.user_id() {
            None => "Now showing events for all users".to_string(),
            Some(id) => {
                let data = ctx.store.snapshot();
                let user = data.find_user(id.as_str()).ok_or_else(|| {
                    ToolError::NotFound(format!(
                        "User with ID {} not found. Available users: {}",
                        id,
                        data.user_labels()
                    ))
                })?;
                format!("Now filtering events for user {}", user.name)
            }
        };

        info!("User filter set to {}", filter.as_str());
        ctx.display.modify(|s| s.user_filter = filter.clone());
        Ok(json!({
            "success": true,
            "message": message,
            "currentFilter": filter,
        }))
    }
}

/// Report the filter currently applied.
pub struct GetCurrentFilter {
    schema: ToolSchema,
}

impl GetCurrentFilter {
    /// Create the tool.
    pub fn new() -> Self {
        Self {
            schema: ToolSchema::new(
                "calendar_get_current_filter",
                "Get the current user filter being applied to the calendar",
                ToolAnnotations::READ_ONLY,
            ),
        }
    }
}

#[async_trait]
impl Tool for GetCurrentFilter {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn execute(&self, _input: &ToolInput, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let filter = ctx.display.snapshot().user_filter.clone();
        let data = ctx.store.snapshot();
        let name = filter
            .user_id()
            .and_then(|id| data.find_user(id.as_str()))
            .map(|u| u.name.as_str())
            .unwrap_or("All Users");
        Ok(json!({
            "currentFilter": filter,
            "currentUserName": name,
            "isFilteringByUser": filter.is_filtering(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::testing::{call, ctx};
    use crate::error::ErrorKind;
    use serde_json::Value;

    #[tokio::test]
    async fn test_list_users_reports_filter() {
        let ctx = ctx();
        let out = call(&ListUsers::new(), &ctx, Value::Null).await.unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["users"][0], json!({ "id": "1", "name": "Ann", "hasPicture": false }));
        assert_eq!(out["currentFilter"], "all");
    }

    #[tokio::test]
    async fn test_filter_then_reset_to_all() {
        let ctx = ctx();
        let out = call(&FilterByUser::new(), &ctx, json!({ "userId": "2" })).await.unwrap();
        assert_eq!(out["message"], "Now filtering events for user Bob");

        let current = call(&GetCurrentFilter::new(), &ctx, Value::Null).await.unwrap();
        assert_eq!(current["currentFilter"], "2");
        assert_eq!(current["currentUserName"], "Bob");
        assert_eq!(current["isFilteringByUser"], true);

        call(&FilterByUser::new(), &ctx, json!({ "userId": "all" })).await.unwrap();
        let current = call(&GetCurrentFilter::new(), &ctx, Value::Null).await.unwrap();
        assert_eq!(current["currentUserName"], "All Users");
        assert_eq!(current["isFilteringByUser"], false);
    }

    #[tokio::test]
    async fn test_unknown_user_keeps_filter() {
        let ctx = ctx();
        let err = call(&FilterByUser::new(), &ctx, json!({ "userId": "9" })).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("Ann (1), Bob (2)"));
        assert_eq!(ctx.display.snapshot().user_filter, UserFilter::All);
    }
}
