//! Demo seed data for a fresh calendar.

use agentcal_core::{Event, EventColor, EventId, Time, User};
use chrono::{Duration, NaiveTime, TimeZone, Utc};

use crate::store::CalendarData;

/// Users every demo calendar starts with.
pub fn demo_users() -> Vec<User> {
    vec![
        User::new("1", "Leonardo Ramos").with_picture("/images/leonardo.png"),
        User::new("2", "Michael Doe"),
        User::new("3", "Alice Johnson"),
        User::new("4", "Robert Smith"),
    ]
}

/// A week of events around `today` for the demo users.
pub fn demo_data(today: Time) -> CalendarData {
    let users = demo_users();
    let day = today.date_naive();
    let at = |offset: i64, hour: u32, minutes: i64| -> (Time, Time) {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let start = Utc.from_utc_datetime(&(day + Duration::days(offset)).and_time(time));
        (start, start + Duration::minutes(minutes))
    };

    let plan: [(&str, &str, i64, u32, i64, EventColor, usize); 5] = [
        ("Design review", "Walk through the new onboarding flow", 0, 10, 60, EventColor::Blue, 0),
        ("Lunch with Alice", "", 0, 12, 60, EventColor::Green, 2),
        ("Quarterly planning", "Roadmap for the next quarter", 1, 9, 120, EventColor::Purple, 1),
        ("Dentist", "", 2, 15, 45, EventColor::Red, 3),
        ("Team retro", "What went well, what did not", 4, 16, 60, EventColor::Orange, 0),
    ];

    let base = today.timestamp_millis().max(0) as u64;
    let events = plan
        .iter()
        .enumerate()
        .map(|(i, (title, description, offset, hour, minutes, color, owner))| {
            let (start, end) = at(*offset, *hour, *minutes);
            Event::new(
                EventId::new(base + i as u64),
                *title,
                *description,
                start,
                end,
                *color,
                users[*owner].clone(),
            )
        })
        .collect();

    CalendarData::new(events, users)
}
