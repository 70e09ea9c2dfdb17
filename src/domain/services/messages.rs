//! Plain-text bodies of the chat messages the service posts.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use crate::domain::models::{booking::UpcomingMeeting, event::Event, vote::SlotTally};

pub fn format_time(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_range(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    let s = start.with_timezone(&tz);
    let e = end.with_timezone(&tz);
    if s.date_naive() == e.date_naive() {
        format!("{}-{}", s.format("%Y-%m-%d %H:%M"), e.format("%H:%M"))
    } else {
        format!("{} - {}", s.format("%Y-%m-%d %H:%M"), e.format("%Y-%m-%d %H:%M"))
    }
}

pub fn vote_message(event: &Event, tallies: &[SlotTally], tz: Tz) -> String {
    let mut lines = vec![
        format!("*{}*", event.title),
        format!("Vote by {} ({})", format_time(event.deadline, tz), tz.name()),
    ];
    if let Some(loc) = &event.location {
        lines.push(format!("Location: {}", loc));
    }
    if let Some(url) = &event.meeting_url {
        lines.push(format!("Online: {}", url));
    }
    for (i, t) in tallies.iter().enumerate() {
        lines.push(format!(
            "{}. {}  yes {} / maybe {} / no {}",
            i + 1, format_range(t.start_time, t.end_time, tz), t.yes_count, t.maybe_count, t.no_count
        ));
    }
    lines.join("\n")
}

pub fn decision_notice(event: &Event, winner: &SlotTally, tz: Tz) -> String {
    format!(
        "Decided: *{}* will take place {} ({} confirmed).",
        event.title, format_range(winner.start_time, winner.end_time, tz), winner.yes_count
    )
}

pub fn cancellation_notice(event: &Event, released: Option<(DateTime<Utc>, DateTime<Utc>)>, tz: Tz) -> String {
    match released {
        Some((start, end)) => format!("Cancelled: *{}* ({}) has been called off.", event.title, format_range(start, end, tz)),
        None => format!("Cancelled: *{}* has been called off.", event.title),
    }
}

pub fn vote_reminder(event: &Event, permalink: Option<&str>, tz: Tz) -> String {
    let mut text = format!(
        "Reminder: please vote on *{}* before {} ({}).",
        event.title, format_time(event.deadline, tz), tz.name()
    );
    if let Some(link) = permalink {
        text.push_str(&format!("\n{}", link));
    }
    text
}

pub fn join_reminder(meeting: &UpcomingMeeting, permalink: Option<&str>, tz: Tz) -> String {
    let mut text = format!(
        "Starting soon: *{}* {}",
        meeting.title, format_range(meeting.start_time, meeting.end_time, tz)
    );
    if let Some(place) = meeting.room_name.as_deref().or(meeting.location.as_deref()) {
        text.push_str(&format!("\nWhere: {}", place));
    }
    if let Some(link) = meeting.meeting_url.as_deref().or(permalink) {
        text.push_str(&format!("\n{}", link));
    }
    text
}
