//! Activity entries.

use agentcal_core::Time;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(Ulid);

impl ActivityId {
    /// Generate a new ActivityId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What kind of action an entry records.
///
/// Closed set: deserializing an unknown kind fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// An agent session branch was created
    BranchCreated,
    /// An event was created
    EventCreated,
    /// An event was updated
    EventUpdated,
    /// An event was deleted
    EventDeleted,
    /// Any other tool call completed
    ToolResult,
    /// A branch diff was previewed
    ChangesPreviewed,
    /// A branch was merged into main
    ChangesMerged,
    /// A branch was dropped without merging
    ChangesDiscarded,
}

impl ActivityKind {
    /// Human label shown in the activity feed.
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::BranchCreated => "Branch Created",
            ActivityKind::EventCreated => "Event Created",
            ActivityKind::EventUpdated => "Event Updated",
            ActivityKind::EventDeleted => "Event Deleted",
            ActivityKind::ToolResult => "Tool Result",
            ActivityKind::ChangesPreviewed => "Changes Previewed",
            ActivityKind::ChangesMerged => "Changes Merged",
            ActivityKind::ChangesDiscarded => "Changes Discarded",
        }
    }

    /// Icon shown next to the label.
    pub fn icon(self) -> &'static str {
        match self {
            ActivityKind::BranchCreated => "🌿",
            ActivityKind::EventCreated => "📅",
            ActivityKind::EventUpdated => "✏️",
            ActivityKind::EventDeleted => "🗑️",
            ActivityKind::ToolResult => "🔧",
            ActivityKind::ChangesPreviewed => "👀",
            ActivityKind::ChangesMerged => "🔀",
            ActivityKind::ChangesDiscarded => "↩️",
        }
    }
}

/// Outcome of the recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    /// Still running
    Pending,
    /// Completed successfully
    Success,
    /// Failed
    Error,
    /// Informational, no outcome
    #[default]
    None,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityStatus::Pending => write!(f, "pending"),
            ActivityStatus::Success => write!(f, "success"),
            ActivityStatus::Error => write!(f, "error"),
            ActivityStatus::None => write!(f, "none"),
        }
    }
}

/// A recorded action. Never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Unique identifier
    pub id: ActivityId,

    /// Kind of action
    #[serde(rename = "type")]
    pub kind: ActivityKind,

    /// Agent that acted, `None` for the user or the system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,

    /// Tool that was called
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// What happened
    pub description: String,

    /// Outcome
    #[serde(default)]
    pub status: ActivityStatus,

    /// When it was recorded
    pub timestamp: Time,
}

/// An entry about to be recorded. Id and timestamp are assigned by the
/// ledger unless set here.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub(crate) id: Option<ActivityId>,
    pub(crate) kind: ActivityKind,
    pub(crate) agent_name: Option<String>,
    pub(crate) tool_name: Option<String>,
    pub(crate) description: String,
    pub(crate) status: ActivityStatus,
    pub(crate) timestamp: Option<Time>,
}

impl NewActivity {
    /// Start an entry of `kind`.
    pub fn new(kind: ActivityKind, description: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            agent_name: None,
            tool_name: None,
            description: description.into(),
            status: ActivityStatus::None,
            timestamp: None,
        }
    }

    /// Attribute the entry to an agent.
    pub fn agent(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Attribute to an agent when one is given.
    pub fn maybe_agent(mut self, name: Option<&str>) -> Self {
        self.agent_name = name.map(str::to_string);
        self
    }

    /// Name the tool involved.
    pub fn tool(mut self, name: impl Into<String>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    /// Set the outcome.
    pub fn status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    /// Reuse an existing id, e.g. to resolve an earlier pending entry.
    pub fn with_id(mut self, id: ActivityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Use an explicit timestamp.
    pub fn at(mut self, timestamp: Time) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub(crate) fn into_entry(self, now: Time) -> ActivityEntry {
        ActivityEntry {
            id: self.id.unwrap_or_default(),
            kind: self.kind,
            agent_name: self.agent_name,
            tool_name: self.tool_name,
            description: self.description,
            status: self.status,
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_wire_shape() {
        let entry = NewActivity::new(ActivityKind::EventCreated, "Created Sync")
            .agent("alice")
            .tool("calendar_create_event")
            .status(ActivityStatus::Success)
            .into_entry(chrono::Utc::now());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "event_created");
        assert_eq!(json["agentName"], "alice");
        assert_eq!(json["toolName"], "calendar_create_event");
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let raw = json!({
            "id": ActivityId::new(),
            "type": "event_teleported",
            "description": "?",
            "status": "none",
            "timestamp": chrono::Utc::now(),
        });
        assert!(serde_json::from_value::<ActivityEntry>(raw).is_err());
    }

    #[test]
    fn test_builder_keeps_given_id_and_time() {
        let id = ActivityId::new();
        let at = chrono::Utc::now() - chrono::Duration::minutes(5);
        let entry = NewActivity::new(ActivityKind::ToolResult, "x")
            .with_id(id)
            .at(at)
            .into_entry(chrono::Utc::now());
        assert_eq!(entry.id, id);
        assert_eq!(entry.timestamp, at);
        assert_eq!(entry.status, ActivityStatus::None);
        assert!(entry.agent_name.is_none());
    }

    #[test]
    fn test_every_kind_has_label() {
        for kind in [
            ActivityKind::BranchCreated,
            ActivityKind::EventCreated,
            ActivityKind::EventUpdated,
            ActivityKind::EventDeleted,
            ActivityKind::ToolResult,
            ActivityKind::ChangesPreviewed,
            ActivityKind::ChangesMerged,
            ActivityKind::ChangesDiscarded,
        ] {
            assert!(!kind.label().is_empty());
            assert!(!kind.icon().is_empty());
        }
    }
}
