use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use crate::domain::models::{
    booking::{Booking, ScheduleRow},
    room::Room,
};
use crate::domain::ports::{BookingRepository, EventRepository, RoomRepository};
use crate::error::AppError;

const MAX_SCHEDULE_DAYS: i64 = 62;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomBusy {
    pub room_id: String,
    pub room_name: String,
    /// End of the booking running right now.
    pub occupied_until: Option<DateTime<Utc>>,
    /// Start of the next booking when the room is currently free.
    pub next_start: Option<DateTime<Utc>>,
}

impl RoomBusy {
    pub fn is_free(&self) -> bool {
        self.occupied_until.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub entries: Vec<ScheduleRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSchedule {
    pub room_id: String,
    pub room_name: String,
    pub days: Vec<DaySchedule>,
}

/// Per-room occupation at `now`. `bookings` must only contain bookings that have not ended.
pub fn busy_now(rooms: &[Room], bookings: &[Booking], now: DateTime<Utc>) -> Vec<RoomBusy> {
    rooms.iter().map(|room| {
        let own = bookings.iter().filter(|b| b.room_id.as_deref() == Some(room.id.as_str()));

        let mut occupied_until: Option<DateTime<Utc>> = None;
        let mut next_start: Option<DateTime<Utc>> = None;
        for b in own {
            if b.start_time <= now && now < b.end_time {
                occupied_until = Some(occupied_until.map_or(b.end_time, |t| t.max(b.end_time)));
            } else if b.start_time > now {
                next_start = Some(next_start.map_or(b.start_time, |t| t.min(b.start_time)));
            }
        }

        RoomBusy {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            next_start: if occupied_until.is_some() { None } else { next_start },
            occupied_until,
        }
    }).collect()
}

/// UTC bounds of the local days `from..=to` in `tz`.
pub fn day_range(from: NaiveDate, to: NaiveDate, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    if to < from {
        return Err(AppError::Validation("'to' must not be before 'from'".into()));
    }
    if (to - from).num_days() >= MAX_SCHEDULE_DAYS {
        return Err(AppError::Validation(format!("At most {} days can be requested", MAX_SCHEDULE_DAYS)));
    }

    let start = local_midnight(from, tz)?;
    let end = local_midnight(to + Duration::days(1), tz)?;
    Ok((start, end))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    let naive = date.and_hms_opt(0, 0, 0).ok_or(AppError::Internal)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or(AppError::Validation(format!("{} has no local midnight in {}", date, tz.name())))
}

/// Groups bookings and candidate slots by room, then by local start day.
pub fn group_schedule(rooms: &[Room], rows: Vec<ScheduleRow>, tz: Tz) -> Vec<RoomSchedule> {
    let mut by_room: BTreeMap<String, BTreeMap<NaiveDate, Vec<ScheduleRow>>> = BTreeMap::new();
    for row in rows {
        let day = row.start_time.with_timezone(&tz).date_naive();
        by_room.entry(row.room_id.clone()).or_default().entry(day).or_default().push(row);
    }

    rooms.iter().map(|room| {
        let days = by_room.remove(&room.id).unwrap_or_default()
            .into_iter()
            .map(|(date, mut entries)| {
                entries.sort_by_key(|e| (e.start_time, e.end_time));
                DaySchedule { date, entries }
            })
            .collect();
        RoomSchedule { room_id: room.id.clone(), room_name: room.name.clone(), days }
    }).collect()
}

/// Read side of room occupation for visualization.
pub struct AvailabilityService {
    rooms: Arc<dyn RoomRepository>,
    events: Arc<dyn EventRepository>,
    bookings: Arc<dyn BookingRepository>,
    display_tz: Tz,
}

impl AvailabilityService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        events: Arc<dyn EventRepository>,
        bookings: Arc<dyn BookingRepository>,
        display_tz: Tz,
    ) -> Self {
        Self { rooms, events, bookings, display_tz }
    }

    pub async fn busy_now(&self, now: DateTime<Utc>) -> Result<Vec<RoomBusy>, AppError> {
        let rooms = self.rooms.list().await?;
        let active = self.bookings.list_active(now).await?;
        Ok(busy_now(&rooms, &active, now))
    }

    pub async fn schedule(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<RoomSchedule>, AppError> {
        let (start, end) = day_range(from, to, self.display_tz)?;
        let rooms = self.rooms.list().await?;

        let mut rows = self.bookings.list_in_range(start, end).await?;
        rows.extend(self.events.list_candidate_slots_in_range(start, end).await?);

        Ok(group_schedule(&rooms, rows, self.display_tz))
    }
}
