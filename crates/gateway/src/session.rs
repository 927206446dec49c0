//! Agent sessions and branch coordination.
//!
//! Each agent works on its own branch of the calendar. Branch edits stay
//! invisible to the main view until the branch is merged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use agentcal_activity::{ActivityKind, ActivityLedger, ActivityStatus, NewActivity};
use agentcal_core::{Event, EventId, Time};
use agentcal_storage::{CalendarData, EventStore};

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session coordination errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The agent already has an open session
    #[error("Agent {0} already has an active session")]
    AlreadyActive(String),

    /// The agent has no open session
    #[error("No active session for agent {0}")]
    NoSession(String),
}

/// Which version of the calendar a call reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "view", content = "agentId")]
pub enum ViewTarget {
    /// The shared calendar
    #[default]
    Main,
    /// An agent's branch
    Agent(String),
}

impl ViewTarget {
    /// Branch of `agent_id`.
    pub fn agent(agent_id: impl Into<String>) -> Self {
        ViewTarget::Agent(agent_id.into())
    }

    /// Whether this is the main view.
    pub fn is_main(&self) -> bool {
        matches!(self, ViewTarget::Main)
    }
}

impl std::fmt::Display for ViewTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewTarget::Main => write!(f, "main"),
            ViewTarget::Agent(id) => write!(f, "{}", branch_name(id)),
        }
    }
}

fn branch_name(agent_id: &str) -> String {
    format!("agent/{}", agent_id)
}

/// An open agent session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    /// Agent identifier, unique among open sessions
    pub agent_id: String,
    /// Model driving the agent
    pub model_name: String,
    /// Branch name, `agent/<agentId>`
    pub branch: String,
    /// When the session was opened
    pub created_at: Time,
}

/// Changes a branch made since it forked from main.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDiff {
    /// Events created on the branch
    pub added: Vec<Event>,
    /// Events edited on the branch, in their branch version
    pub modified: Vec<Event>,
    /// Events deleted on the branch, in their fork-time version
    pub removed: Vec<Event>,
}

impl BranchDiff {
    /// Compare `branch` against the snapshot it forked from.
    pub fn between(base: &CalendarData, branch: &CalendarData) -> Self {
        let base_by_id: HashMap<EventId, &Event> = base.events.iter().map(|e| (e.id, e)).collect();
        let mut diff = BranchDiff::default();
        for event in &branch.events {
            match base_by_id.get(&event.id) {
                None => diff.added.push(event.clone()),
                Some(original) if *original != event => diff.modified.push(event.clone()),
                Some(_) => {}
            }
        }
        diff.removed = base
            .events
            .iter()
            .filter(|e| branch.find_event(e.id).is_none())
            .cloned()
            .collect();
        diff
    }

    /// Whether the branch changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// `2 added, 1 modified, 0 removed`
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} modified, {} removed",
            self.added.len(),
            self.modified.len(),
            self.removed.len()
        )
    }
}

/// Result of merging a branch into main.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Agent whose branch was merged
    pub agent_id: String,
    /// What the branch changed
    pub diff: BranchDiff,
    /// Events main also changed since the fork; the branch version won
    pub conflicts: Vec<EventId>,
}

/// Opens, inspects, merges and drops agent branches.
#[async_trait]
pub trait SessionCoordinator: Send + Sync {
    /// Open a session and fork its branch from main.
    async fn create_session(&self, agent_id: &str, model_name: &str) -> Result<AgentSession>;

    /// Open sessions, oldest first.
    async fn list_active(&self) -> Vec<AgentSession>;

    /// What the agent's branch changed since it forked from main.
    async fn preview(&self, agent_id: &str) -> Result<BranchDiff>;

    /// Apply the agent's branch to main and close the session.
    async fn merge(&self, agent_id: &str) -> Result<MergeOutcome>;

    /// Close the session without applying its branch.
    async fn discard(&self, agent_id: &str) -> Result<()>;

    /// Make `view` the view for calls that name no agent.
    async fn checkout(&self, view: ViewTarget) -> Result<()>;

    /// The view for calls that name no agent.
    async fn active_view(&self) -> ViewTarget;

    /// Event store behind `view`.
    async fn store(&self, view: &ViewTarget) -> Result<Arc<EventStore>>;

    /// The main event store.
    fn main_store(&self) -> Arc<EventStore>;
}

struct Branch {
    session: AgentSession,
    base: Arc<CalendarData>,
    store: Arc<EventStore>,
}

/// In-memory coordinator that forks a full snapshot per session.
pub struct BranchCoordinator {
    main: Arc<EventStore>,
    branches: Mutex<Vec<Branch>>,
    active: Mutex<ViewTarget>,
    ledger: Arc<ActivityLedger>,
}

impl BranchCoordinator {
    /// Create a coordinator over `main`, recording into `ledger`.
    pub fn new(main: Arc<EventStore>, ledger: Arc<ActivityLedger>) -> Self {
        Self {
            main,
            branches: Mutex::new(Vec::new()),
            active: Mutex::new(ViewTarget::Main),
            ledger,
        }
    }

    async fn close(&self, agent_id: &str) -> Result<Branch> {
        let mut branches = self.branches.lock().await;
        let index = branches
            .iter()
            .position(|b| b.session.agent_id == agent_id)
            .ok_or_else(|| SessionError::NoSession(agent_id.to_string()))?;
        let branch = branches.remove(index);
        drop(branches);

        let mut active = self.active.lock().await;
        if *active == ViewTarget::agent(agent_id) {
            debug!("Closed branch was checked out, returning to main");
            *active = ViewTarget::Main;
        }
        Ok(branch)
    }
}

/// Three-way merge of a branch diff onto `main`. Returns the merged data and
/// the ids main had also changed since the fork.
fn apply_diff(main: &CalendarData, base: &CalendarData, diff: &BranchDiff) -> (CalendarData, Vec<EventId>) {
    let mut merged = main.clone();
    let mut conflicts = Vec::new();
    let changed_on_main = |id: EventId| main.find_event(id) != base.find_event(id);

    for event in &diff.removed {
        if changed_on_main(event.id) {
            conflicts.push(event.id);
        }
        merged = merged.with_event_removed(event.id);
    }

    for event in &diff.modified {
        if changed_on_main(event.id) {
            conflicts.push(event.id);
        }
        merged = if merged.find_event(event.id).is_some() {
            merged.with_event_replaced(event.clone())
        } else {
            merged.with_event_added(event.clone())
        };
    }

    for event in &diff.added {
        let mut event = event.clone();
        if merged.find_event(event.id).is_some() {
            let id = merged.next_event_id(event.id.get());
            warn!("Event id {} already taken on main, merging as {}", event.id, id);
            event.id = id;
        }
        merged = merged.with_event_added(event);
    }

    (merged, conflicts)
}

#[async_trait]
impl SessionCoordinator for BranchCoordinator {
    async fn create_session(&self, agent_id: &str, model_name: &str) -> Result<AgentSession> {
        let mut branches = self.branches.lock().await;
        if branches.iter().any(|b| b.session.agent_id == agent_id) {
            return Err(SessionError::AlreadyActive(agent_id.to_string()));
        }

        let base = self.main.snapshot();
        let session = AgentSession {
            agent_id: agent_id.to_string(),
            model_name: model_name.to_string(),
            branch: branch_name(agent_id),
            created_at: chrono::Utc::now(),
        };
        branches.push(Branch {
            session: session.clone(),
            store: Arc::new(EventStore::new((*base).clone())),
            base,
        });
        drop(branches);

        info!("Opened session {} ({})", session.branch, model_name);
        self.ledger.record(
            NewActivity::new(
                ActivityKind::BranchCreated,
                format!("Created branch {} for {}", session.branch, model_name),
            )
            .agent(agent_id),
        );
        Ok(session)
    }

    async fn list_active(&self) -> Vec<AgentSession> {
        self.branches
            .lock()
            .await
            .iter()
            .map(|b| b.session.clone())
            .collect()
    }

    async fn preview(&self, agent_id: &str) -> Result<BranchDiff> {
        let diff = {
            let branches = self.branches.lock().await;
            let branch = branches
                .iter()
                .find(|b| b.session.agent_id == agent_id)
                .ok_or_else(|| SessionError::NoSession(agent_id.to_string()))?;
            BranchDiff::between(&branch.base, &branch.store.snapshot())
        };

        self.ledger.record(
            NewActivity::new(
                ActivityKind::ChangesPreviewed,
                format!("Previewed {}: {}", branch_name(agent_id), diff.summary()),
            )
            .agent(agent_id),
        );
        Ok(diff)
    }

    async fn merge(&self, agent_id: &str) -> Result<MergeOutcome> {
        let branch = self.close(agent_id).await?;
        let diff = BranchDiff::between(&branch.base, &branch.store.snapshot());

        let conflicts = self
            .main
            .update(|main| {
                let (merged, conflicts) = apply_diff(main, &branch.base, &diff);
                Ok::<_, std::convert::Infallible>((merged, conflicts))
            })
            .unwrap_or_else(|never| match never {});

        if !conflicts.is_empty() {
            warn!("Merged {} over {} conflicting event(s)", branch.session.branch, conflicts.len());
        }
        let mut description = format!("Merged {} into main: {}", branch.session.branch, diff.summary());
        if !conflicts.is_empty() {
            description.push_str(&format!(", {} conflict(s) resolved in favour of the branch", conflicts.len()));
        }
        info!("{}", description);
        self.ledger.record(
            NewActivity::new(ActivityKind::ChangesMerged, description)
                .agent(agent_id)
                .status(ActivityStatus::Success),
        );

        Ok(MergeOutcome {
            agent_id: agent_id.to_string(),
            diff,
            conflicts,
        })
    }

    async fn discard(&self, agent_id: &str) -> Result<()> {
        let branch = self.close(agent_id).await?;
        info!("Discarded {}", branch.session.branch);
        self.ledger.record(
            NewActivity::new(
                ActivityKind::ChangesDiscarded,
                format!("Discarded {}", branch.session.branch),
            )
            .agent(agent_id),
        );
        Ok(())
    }

    async fn checkout(&self, view: ViewTarget) -> Result<()> {
        if let ViewTarget::Agent(agent_id) = &view {
            let branches = self.branches.lock().await;
            if !branches.iter().any(|b| &b.session.agent_id == agent_id) {
                return Err(SessionError::NoSession(agent_id.clone()));
            }
        }
        debug!("Checked out {}", view);
        *self.active.lock().await = view;
        Ok(())
    }

    async fn active_view(&self) -> ViewTarget {
        self.active.lock().await.clone()
    }

    async fn store(&self, view: &ViewTarget) -> Result<Arc<EventStore>> {
        match view {
            ViewTarget::Main => Ok(self.main.clone()),
            ViewTarget::Agent(agent_id) => self
                .branches
                .lock()
                .await
                .iter()
                .find(|b| &b.session.agent_id == agent_id)
                .map(|b| b.store.clone())
                .ok_or_else(|| SessionError::NoSession(agent_id.clone())),
        }
    }

    fn main_store(&self) -> Arc<EventStore> {
        self.main.clone()
    }
}
