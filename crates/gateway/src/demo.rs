//! Scripted multi-agent scenarios.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use serde_json::json;
use tracing::info;

use agentcal_activity::{ActivityKind, ActivityStatus, NewActivity};
use agentcal_core::EventColor;
use agentcal_tools::ToolError;

use crate::dispatcher::{Gateway, ToolCall};
use crate::session::{BranchDiff, SessionError};

/// Demo scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// One agent schedules a week of meetings
    Single,
    /// Two agents book overlapping meetings on separate branches
    Conflict,
}

/// Demo failure.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// A tool call failed
    #[error(transparent)]
    Tool(#[from] ToolError),
    /// A session operation failed
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a scenario left behind.
#[derive(Debug, Clone, Default)]
pub struct DemoReport {
    /// Branch diffs per agent, in session order
    pub previews: Vec<(String, BranchDiff)>,
    /// Pairs of event titles that overlap across branches
    pub overlaps: Vec<(String, String)>,
}

struct Meeting {
    title: &'static str,
    day_offset: i64,
    hour: u32,
    minutes: i64,
    color: EventColor,
}

const SCHEDULER: [Meeting; 3] = [
    Meeting { title: "Team Standup", day_offset: 1, hour: 9, minutes: 30, color: EventColor::Blue },
    Meeting { title: "Sprint Planning", day_offset: 2, hour: 10, minutes: 60, color: EventColor::Green },
    Meeting { title: "1:1 with Manager", day_offset: 3, hour: 14, minutes: 30, color: EventColor::Purple },
];

const ALICE: [Meeting; 2] = [
    Meeting { title: "Alice: Client Call", day_offset: 1, hour: 14, minutes: 60, color: EventColor::Blue },
    Meeting { title: "Alice: Team Sync", day_offset: 2, hour: 10, minutes: 30, color: EventColor::Green },
];

const BOB: [Meeting; 2] = [
    Meeting { title: "Bob: Strategy Meeting", day_offset: 1, hour: 14, minutes: 90, color: EventColor::Orange },
    Meeting { title: "Bob: Review", day_offset: 3, hour: 11, minutes: 45, color: EventColor::Purple },
];

/// Run `scenario` against `gateway`.
pub async fn run(gateway: &Gateway, scenario: Scenario) -> Result<DemoReport, DemoError> {
    info!("Running {:?} demo", scenario);
    match scenario {
        Scenario::Single => {
            gateway.ledger().record(
                NewActivity::new(ActivityKind::BranchCreated, "Starting single-agent demo...")
                    .agent("Claude Scheduler"),
            );
            schedule(gateway, "scheduler", "claude", &SCHEDULER, "meetings for the week").await?;
            let diff = gateway.sessions().preview("scheduler").await?;
            Ok(DemoReport {
                previews: vec![("scheduler".to_string(), diff)],
                overlaps: Vec::new(),
            })
        }
        Scenario::Conflict => {
            gateway.ledger().record(NewActivity::new(
                ActivityKind::BranchCreated,
                "Starting multi-agent conflict demo...",
            ));
            schedule(gateway, "alice-assistant", "claude", &ALICE, "meetings for Alice").await?;
            schedule(gateway, "bob-assistant", "gpt4", &BOB, "meetings for Bob").await?;

            let alice = gateway.sessions().preview("alice-assistant").await?;
            let bob = gateway.sessions().preview("bob-assistant").await?;
            let overlaps = overlapping(&alice, &bob);
            gateway.ledger().record(NewActivity::new(
                ActivityKind::ChangesPreviewed,
                format!(
                    "Two agents have pending changes with {} overlapping meeting(s). Review them before merging.",
                    overlaps.len()
                ),
            ));
            Ok(DemoReport {
                previews: vec![
                    ("alice-assistant".to_string(), alice),
                    ("bob-assistant".to_string(), bob),
                ],
                overlaps,
            })
        }
    }
}

async fn schedule(
    gateway: &Gateway,
    agent_id: &str,
    model: &str,
    meetings: &[Meeting],
    what: &str,
) -> Result<(), DemoError> {
    gateway.sessions().create_session(agent_id, model).await?;
    let pending = gateway.ledger().record(
        NewActivity::new(ActivityKind::EventCreated, format!("Scheduling {}...", what))
            .agent(agent_id)
            .status(ActivityStatus::Pending),
    );

    let user_id = gateway
        .sessions()
        .main_store()
        .snapshot()
        .users
        .first()
        .map(|u| u.id.to_string())
        .unwrap_or_else(|| "1".to_string());
    let day = gateway.display().snapshot().selected_date.date_naive();

    for meeting in meetings {
        let time = NaiveTime::from_hms_opt(meeting.hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let start = Utc.from_utc_datetime(&(day + Duration::days(meeting.day_offset)).and_time(time));
        let end = start + Duration::minutes(meeting.minutes);
        let call = ToolCall::new(
            "calendar_create_event",
            json!({
                "title": meeting.title,
                "description": "AI-scheduled meeting",
                "startDate": start.to_rfc3339(),
                "endDate": end.to_rfc3339(),
                "color": meeting.color,
                "userId": user_id,
            }),
        )
        .as_agent(agent_id);

        if let Err(e) = gateway.call(call).await {
            gateway.ledger().record(
                NewActivity::new(ActivityKind::ToolResult, format!("Demo failed: {}", e))
                    .agent(agent_id)
                    .status(ActivityStatus::Error),
            );
            return Err(e.into());
        }
    }

    gateway.ledger().record(
        NewActivity::new(
            ActivityKind::EventCreated,
            format!("Created {} {}", meetings.len(), what),
        )
        .agent(agent_id)
        .with_id(pending.id)
        .status(ActivityStatus::Success),
    );
    Ok(())
}

fn overlapping(a: &BranchDiff, b: &BranchDiff) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for x in &a.added {
        for y in &b.added {
            if x.start_date < y.end_date && y.start_date < x.end_date {
                pairs.push((x.title.clone(), y.title.clone()));
            }
        }
    }
    pairs
}
