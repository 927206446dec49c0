//! Gateway dispatcher: the one place tool calls enter.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn, Instrument};

use agentcal_activity::{
    ActivityEntry, ActivityKind, ActivityLedger, ActivityStatus, NewActivity, RECENT_ACTIVITY_WINDOW,
};
use agentcal_core::Time;
use agentcal_storage::seed::{demo_data, demo_users};
use agentcal_storage::{CalendarData, DisplayState, EventStore, JsonStorage, SnapshotStorage};
use agentcal_tools::{validate, Clock, SystemClock, ToolContext, ToolError, ToolOutput, ToolRegistry};

use crate::config::GatewayConfig;
use crate::session::{BranchCoordinator, MergeOutcome, SessionCoordinator, SessionError, ViewTarget};

/// Model name recorded for sessions opened without one.
pub(crate) const IMPLICIT_MODEL: &str = "unknown";

/// A named tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Raw JSON payload
    #[serde(default)]
    pub arguments: Value,
    /// Calling agent; `None` for the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl ToolCall {
    /// A call made by the user.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            agent_id: None,
        }
    }

    /// Make the call on behalf of `agent_id`.
    pub fn as_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Gateway errors outside tool calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Storage could not be opened, read or written
    #[error(transparent)]
    Storage(#[from] agentcal_storage::StorageError),

    /// A session operation failed
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Routes tool calls to handlers against the right calendar view.
pub struct Gateway {
    registry: ToolRegistry,
    sessions: Arc<dyn SessionCoordinator>,
    display: Arc<DisplayState>,
    ledger: Arc<ActivityLedger>,
    storage: Option<Arc<dyn SnapshotStorage>>,
    clock: Arc<dyn Clock>,
    recent_window: Duration,
}

impl Gateway {
    /// Gateway over `data` with every calendar tool and an in-memory
    /// branch coordinator.
    pub fn new(data: CalendarData) -> Self {
        let ledger = Arc::new(ActivityLedger::new());
        let main = Arc::new(EventStore::new(data));
        let sessions = Arc::new(BranchCoordinator::new(main, ledger.clone()));
        Self {
            registry: ToolRegistry::calendar(),
            sessions,
            display: Arc::new(DisplayState::new(chrono::Utc::now())),
            ledger,
            storage: None,
            clock: Arc::new(SystemClock),
            recent_window: RECENT_ACTIVITY_WINDOW,
        }
    }

    /// Open the gateway described by `config`.
    ///
    /// With a storage path the saved calendar is loaded; when there is none
    /// yet the initial calendar is saved as the first revision.
    pub async fn open(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let today = chrono::Utc::now();
        let fresh = || {
            if config.seed {
                demo_data(today)
            } else {
                CalendarData::new(Vec::new(), demo_users())
            }
        };

        let Some(path) = &config.storage_path else {
            return Ok(Self::new(fresh()).with_recent_window(config.recent_window));
        };

        let storage = Arc::new(JsonStorage::new(path).await?);
        let data = match storage.load().await? {
            Some(data) => {
                info!("Loaded {} events from {}", data.events.len(), path.display());
                data
            }
            None => {
                let data = fresh();
                storage.save(&data, "Initial calendar").await?;
                data
            }
        };
        Ok(Self::new(data)
            .with_storage(storage)
            .with_recent_window(config.recent_window))
    }

    /// Persist the main view after every successful write to it.
    pub fn with_storage(mut self, storage: Arc<dyn SnapshotStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the session coordinator.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionCoordinator>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// How long ledger entries count as recent activity.
    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }

    /// Registered tools.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Session coordinator.
    pub fn sessions(&self) -> &Arc<dyn SessionCoordinator> {
        &self.sessions
    }

    /// Activity ledger.
    pub fn ledger(&self) -> &Arc<ActivityLedger> {
        &self.ledger
    }

    /// Shared display state.
    pub fn display(&self) -> &Arc<DisplayState> {
        &self.display
    }

    /// Current time of the gateway clock.
    pub fn now(&self) -> Time {
        self.clock.now()
    }

    /// Ledger entries inside the recent-activity window.
    pub fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.ledger.recent(self.recent_window, self.now())
    }

    /// Whether anything happened inside the recent-activity window.
    pub fn has_recent_activity(&self) -> bool {
        self.ledger.has_recent(self.recent_window, self.now())
    }

    /// Merge the agent's branch into main and save main as a new revision.
    ///
    /// When the save fails the merge stays applied in memory and the error
    /// is returned; the next successful save writes it.
    pub async fn merge(&self, agent_id: &str) -> Result<MergeOutcome, GatewayError> {
        let outcome = self.sessions.merge(agent_id).await?;
        if let Some(storage) = &self.storage {
            let main = self.sessions.main_store();
            let message = format!("Merge {}", ViewTarget::agent(agent_id));
            match storage.save(&main.snapshot(), &message).await {
                Ok(revision) => debug!("Saved merge as revision {}", revision.version),
                Err(e) => {
                    error!("Failed to persist merge of {}: {}", agent_id, e);
                    return Err(e.into());
                }
            }
        }
        Ok(outcome)
    }

    /// Invoke a tool and return its output or error.
    ///
    /// Exactly one ledger entry is recorded per call, whatever the outcome.
    pub async fn call(&self, call: ToolCall) -> Result<ToolOutput, ToolError> {
        let agent = call.agent_id.as_deref().unwrap_or("user");
        let span = info_span!("tool_call", tool = %call.name, agent = %agent);
        async {
            let result = self.dispatch(&call).await;
            match &result {
                Ok(_) => debug!("Tool call succeeded"),
                Err(e) => warn!(kind = %e.kind(), "Tool call failed: {}", e),
            }
            self.record(&call, &result);
            result
        }
        .instrument(span)
        .await
    }

    /// Invoke a tool and wrap the outcome in the wire envelope:
    /// `{ "ok": true, "result": ... }` or `{ "error": { ... } }`.
    pub async fn handle(&self, call: ToolCall) -> Value {
        match self.call(call).await {
            Ok(result) => json!({ "ok": true, "result": result }),
            Err(e) => e.to_envelope(),
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ToolError::ToolNotFound(call.name.clone()))?;
        let input = validate(tool.schema(), &call.arguments)?;

        let view = match &call.agent_id {
            Some(agent_id) => ViewTarget::agent(agent_id),
            None => self.sessions.active_view().await,
        };
        let store = self.resolve_store(&view).await?;
        let before = store.snapshot();
        let version = store.version();

        let ctx = ToolContext::new(store.clone(), self.display.clone()).with_clock(self.clock.clone());
        let output = tool.execute(&input, &ctx).await?;

        let written = store.version();
        if view.is_main() && !tool.schema().annotations.read_only && written != version {
            if let Err(e) = self.persist(&store, call).await {
                if store.version() == written {
                    debug!("Restoring main to its state before {}", call.name);
                    store.replace((*before).clone());
                } else {
                    warn!("Main changed while saving {}; keeping the newer snapshot", call.name);
                }
                return Err(e);
            }
        }
        Ok(output)
    }

    async fn resolve_store(&self, view: &ViewTarget) -> Result<Arc<EventStore>, ToolError> {
        match self.sessions.store(view).await {
            Ok(store) => Ok(store),
            Err(SessionError::NoSession(agent_id)) => {
                info!("Opening session for {} on first call", agent_id);
                match self.sessions.create_session(&agent_id, IMPLICIT_MODEL).await {
                    Ok(_) => {}
                    Err(SessionError::AlreadyActive(_)) => {
                        debug!("Session for {} opened by a concurrent call", agent_id)
                    }
                    Err(e) => return Err(ToolError::Internal(e.to_string())),
                }
                self.sessions
                    .store(view)
                    .await
                    .map_err(|e| ToolError::Internal(e.to_string()))
            }
            Err(e) => Err(ToolError::Internal(e.to_string())),
        }
    }

    async fn persist(&self, store: &EventStore, call: &ToolCall) -> Result<(), ToolError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let message = match &call.agent_id {
            Some(agent_id) => format!("{} by {}", call.name, agent_id),
            None => call.name.clone(),
        };
        match storage.save(&store.snapshot(), &message).await {
            Ok(revision) => {
                debug!("Saved revision {}", revision.version);
                Ok(())
            }
            Err(e) => {
                error!("Failed to persist calendar: {}", e);
                Err(e.into())
            }
        }
    }

    fn record(&self, call: &ToolCall, result: &Result<ToolOutput, ToolError>) {
        let (status, description) = match result {
            Ok(output) => (
                ActivityStatus::Success,
                output
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Called {}", call.name)),
            ),
            Err(e) => (ActivityStatus::Error, e.to_string()),
        };
        self.ledger.record(
            NewActivity::new(activity_kind(&call.name), description)
                .maybe_agent(call.agent_id.as_deref())
                .tool(&call.name)
                .status(status)
                .at(self.now()),
        );
    }
}

fn activity_kind(tool: &str) -> ActivityKind {
    match tool {
        "calendar_create_event" => ActivityKind::EventCreated,
        "calendar_update_event" => ActivityKind::EventUpdated,
        "calendar_delete_event" => ActivityKind::EventDeleted,
        _ => ActivityKind::ToolResult,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcal_core::User;
    use agentcal_storage::{MemoryStorage, Revision, StorageError};
    use agentcal_tools::{ErrorKind, FixedClock};
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Storage whose writes always fail.
    struct FullDisk;

    #[async_trait]
    impl SnapshotStorage for FullDisk {
        async fn load(&self) -> agentcal_storage::Result<Option<CalendarData>> {
            Ok(None)
        }

        async fn save(&self, _data: &CalendarData, _message: &str) -> agentcal_storage::Result<Revision> {
            Err(StorageError::Other("disk full".to_string()))
        }

        async fn history(&self) -> agentcal_storage::Result<Vec<Revision>> {
            Ok(Vec::new())
        }

        async fn rollback(&self, version: u64) -> agentcal_storage::Result<CalendarData> {
            Err(StorageError::NotFound(format!("revision {}", version)))
        }
    }

    /// Opens the agent's session itself the first time its store is asked
    /// for, then reports it missing, as if another call won the race.
    struct LateSessions {
        inner: BranchCoordinator,
        raced: tokio::sync::Mutex<bool>,
    }

    #[async_trait]
    impl SessionCoordinator for LateSessions {
        async fn create_session(&self, agent_id: &str, model_name: &str) -> crate::session::Result<crate::AgentSession> {
            self.inner.create_session(agent_id, model_name).await
        }

        async fn list_active(&self) -> Vec<crate::AgentSession> {
            self.inner.list_active().await
        }

        async fn preview(&self, agent_id: &str) -> crate::session::Result<crate::BranchDiff> {
            self.inner.preview(agent_id).await
        }

        async fn merge(&self, agent_id: &str) -> crate::session::Result<MergeOutcome> {
            self.inner.merge(agent_id).await
        }

        async fn discard(&self, agent_id: &str) -> crate::session::Result<()> {
            self.inner.discard(agent_id).await
        }

        async fn checkout(&self, view: ViewTarget) -> crate::session::Result<()> {
            self.inner.checkout(view).await
        }

        async fn active_view(&self) -> ViewTarget {
            self.inner.active_view().await
        }

        async fn store(&self, view: &ViewTarget) -> crate::session::Result<Arc<EventStore>> {
            let mut raced = self.raced.lock().await;
            if let (ViewTarget::Agent(agent_id), false) = (view, *raced) {
                *raced = true;
                self.inner.create_session(agent_id, "other").await?;
                return Err(SessionError::NoSession(agent_id.clone()));
            }
            drop(raced);
            self.inner.store(view).await
        }

        fn main_store(&self) -> Arc<EventStore> {
            self.inner.main_store()
        }
    }

    fn gateway() -> Gateway {
        let data = CalendarData::new(vec![], vec![User::new("1", "Ann"), User::new("2", "Bob")]);
        let now = chrono::Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap();
        Gateway::new(data).with_clock(Arc::new(FixedClock(now)))
    }

    fn sync_event(title: &str) -> Value {
        json!({
            "title": title,
            "description": "",
            "startDate": "2025-01-01T09:00Z",
            "endDate": "2025-01-01T09:30Z",
            "color": "blue",
            "userId": "1",
        })
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let gw = gateway();
        let env = gw.handle(ToolCall::new("calendar_teleport", json!({}))).await;
        assert_eq!(env["error"]["kind"], "ToolNotFound");
        let entries = gw.ledger().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ActivityStatus::Error);
        assert_eq!(entries[0].kind, ActivityKind::ToolResult);
    }

    #[tokio::test]
    async fn test_validation_enumerates_fields_and_skips_handler() {
        let gw = gateway();
        let env = gw
            .handle(ToolCall::new("calendar_create_event", json!({ "color": "pink" })))
            .await;
        let fields: Vec<_> = env["error"]["violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["title", "description", "startDate", "endDate", "color", "userId"]);
        assert_eq!(gw.sessions().main_store().event_count(), 0);
        assert_eq!(gw.sessions().main_store().version(), 0);
    }

    #[tokio::test]
    async fn test_envelope_on_success() {
        let gw = gateway();
        let env = gw.handle(ToolCall::new("calendar_create_event", sync_event("Sync"))).await;
        assert_eq!(env["ok"], true);
        assert_eq!(env["result"]["event"]["user"]["name"], "Ann");
        let entry = &gw.ledger().entries()[0];
        assert_eq!(entry.kind, ActivityKind::EventCreated);
        assert_eq!(entry.description, "Event \"Sync\" created successfully");
        assert_eq!(entry.tool_name.as_deref(), Some("calendar_create_event"));
        assert!(entry.agent_name.is_none());
    }

    #[tokio::test]
    async fn test_agents_work_on_isolated_branches() {
        let gw = gateway();
        gw.sessions().create_session("alice", "claude").await.unwrap();
        gw.sessions().create_session("bob", "gpt4").await.unwrap();

        gw.call(ToolCall::new("calendar_create_event", sync_event("Alice sync")).as_agent("alice"))
            .await
            .unwrap();
        gw.call(ToolCall::new("calendar_create_event", sync_event("Bob sync")).as_agent("bob"))
            .await
            .unwrap();

        let main = gw.call(ToolCall::new("calendar_list_events", Value::Null)).await.unwrap();
        assert_eq!(main["count"], 0);
        let alice = gw
            .call(ToolCall::new("calendar_list_events", Value::Null).as_agent("alice"))
            .await
            .unwrap();
        assert_eq!(alice["count"], 1);
        assert_eq!(alice["events"][0]["title"], "Alice sync");

        let created = gw.ledger().of_kind(ActivityKind::EventCreated);
        let agents: Vec<_> = created.iter().map(|e| e.agent_name.as_deref().unwrap()).collect();
        assert_eq!(agents, vec!["alice", "bob"]);

        gw.merge("alice").await.unwrap();
        gw.merge("bob").await.unwrap();
        let main = gw.call(ToolCall::new("calendar_list_events", Value::Null)).await.unwrap();
        assert_eq!(main["count"], 2);
    }

    #[tokio::test]
    async fn test_agent_call_opens_session() {
        let gw = gateway();
        gw.call(ToolCall::new("calendar_list_users", Value::Null).as_agent("carol"))
            .await
            .unwrap();
        let sessions = gw.sessions().list_active().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].model_name, IMPLICIT_MODEL);
    }

    #[tokio::test]
    async fn test_checked_out_branch_receives_user_calls() {
        let gw = gateway();
        gw.sessions().create_session("alice", "claude").await.unwrap();
        gw.sessions().checkout(ViewTarget::agent("alice")).await.unwrap();
        gw.call(ToolCall::new("calendar_create_event", sync_event("Sync"))).await.unwrap();
        assert_eq!(gw.sessions().main_store().event_count(), 0);
        let branch = gw.sessions().store(&ViewTarget::agent("alice")).await.unwrap();
        assert_eq!(branch.event_count(), 1);
    }

    #[tokio::test]
    async fn test_main_writes_are_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let gw = gateway().with_storage(storage.clone());

        gw.call(ToolCall::new("calendar_create_event", sync_event("Sync"))).await.unwrap();
        gw.call(ToolCall::new("calendar_switch_view", json!({ "view": "week" }))).await.unwrap();
        gw.sessions().create_session("alice", "claude").await.unwrap();
        gw.call(ToolCall::new("calendar_create_event", sync_event("Branch")).as_agent("alice"))
            .await
            .unwrap();

        let history = storage.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "calendar_create_event");
        assert_eq!(storage.load().await.unwrap().unwrap().events.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let gw = gateway();
        let created = gw
            .call(ToolCall::new("calendar_create_event", sync_event("Sync")))
            .await
            .unwrap();
        let id = created["event"]["id"].clone();
        gw.call(ToolCall::new("calendar_delete_event", json!({ "eventId": id })))
            .await
            .unwrap();
        let err = gw
            .call(ToolCall::new("calendar_get_event", json!({ "eventId": id })))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let kinds: Vec<_> = gw.ledger().entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ActivityKind::EventCreated, ActivityKind::EventDeleted, ActivityKind::ToolResult]
        );
    }

    #[tokio::test]
    async fn test_open_seeds_and_saves_first_revision() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig {
            storage_path: Some(dir.path().to_path_buf()),
            seed: true,
            ..Default::default()
        };
        let gw = Gateway::open(&config).await.unwrap();
        let seeded = gw.sessions().main_store().event_count();
        assert!(seeded > 0);

        gw.call(ToolCall::new("calendar_create_event", sync_event("Sync"))).await.unwrap();
        drop(gw);

        let reopened = Gateway::open(&config).await.unwrap();
        assert_eq!(reopened.sessions().main_store().event_count(), seeded + 1);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_main_untouched() {
        let gw = gateway().with_storage(Arc::new(FullDisk));

        let env = gw.handle(ToolCall::new("calendar_create_event", sync_event("Sync"))).await;
        assert_eq!(env["error"]["kind"], "Internal");
        assert_eq!(env["error"]["message"], "Internal error: disk full");
        assert_eq!(gw.sessions().main_store().event_count(), 0);

        let entries = gw.ledger().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, ActivityStatus::Error);
    }

    #[tokio::test]
    async fn test_merge_is_saved_as_revision() {
        let storage = Arc::new(MemoryStorage::new());
        let gw = gateway().with_storage(storage.clone());
        gw.call(ToolCall::new("calendar_create_event", sync_event("Alice sync")).as_agent("alice"))
            .await
            .unwrap();
        assert!(storage.history().await.unwrap().is_empty());

        let outcome = gw.merge("alice").await.unwrap();
        assert_eq!(outcome.diff.added.len(), 1);

        let history = storage.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Merge agent/alice");
        let saved = storage.load().await.unwrap().unwrap();
        assert_eq!(saved, *gw.sessions().main_store().snapshot());
        assert_eq!(saved.events[0].title, "Alice sync");
    }

    #[tokio::test]
    async fn test_merge_without_session_fails() {
        let gw = gateway();
        let err = gw.merge("nobody").await.unwrap_err();
        assert!(matches!(err, GatewayError::Session(SessionError::NoSession(_))));
    }

    #[tokio::test]
    async fn test_first_call_tolerates_concurrent_session_open() {
        let data = CalendarData::new(vec![], vec![User::new("1", "Ann")]);
        let ledger = Arc::new(ActivityLedger::new());
        let inner = BranchCoordinator::new(Arc::new(EventStore::new(data.clone())), ledger);
        let gw = Gateway::new(data).with_sessions(Arc::new(LateSessions {
            inner,
            raced: tokio::sync::Mutex::new(false),
        }));

        let out = gw
            .call(ToolCall::new("calendar_create_event", sync_event("Sync")).as_agent("alice"))
            .await
            .unwrap();
        assert_eq!(out["success"], true);
        let sessions = gw.sessions().list_active().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].model_name, "other");
    }

    #[tokio::test]
    async fn test_recent_activity_uses_window() {
        let gw = gateway();
        assert!(!gw.has_recent_activity());
        gw.call(ToolCall::new("calendar_get_settings", Value::Null)).await.unwrap();
        assert!(gw.has_recent_activity());
        assert_eq!(gw.recent_activity().len(), 1);

        let gw = gateway().with_recent_window(Duration::ZERO);
        gw.call(ToolCall::new("calendar_get_settings", Value::Null)).await.unwrap();
        assert!(!gw.has_recent_activity());
    }
}
