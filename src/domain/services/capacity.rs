use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::{booking::OverlappingBooking, room::Room};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CapacityVerdict {
    Ok,
    Exceeded {
        existing: i64,
        capacity: Option<i64>,
    },
}

impl CapacityVerdict {
    pub fn into_result(self, requested: i64) -> Result<(), AppError> {
        match self {
            CapacityVerdict::Ok => Ok(()),
            CapacityVerdict::Exceeded { existing, capacity } => {
                Err(AppError::CapacityExceeded { existing, requested, capacity })
            }
        }
    }
}

/// Decides whether `requested` more people fit next to the overlapping bookings.
///
/// A room of unknown capacity cannot be verified, so any overlap is a conflict.
pub fn evaluate(capacity: Option<i32>, overlapping: &[OverlappingBooking], requested: i64) -> CapacityVerdict {
    let existing: i64 = overlapping.iter().map(OverlappingBooking::headcount).sum();

    match capacity {
        Some(cap) => {
            let cap = i64::from(cap);
            if existing + requested > cap {
                CapacityVerdict::Exceeded { existing, capacity: Some(cap) }
            } else {
                CapacityVerdict::Ok
            }
        }
        None if overlapping.is_empty() => CapacityVerdict::Ok,
        None => CapacityVerdict::Exceeded { existing, capacity: None },
    }
}

/// Capacity check against the other bookings of `room` overlapping `[start, end)`.
pub async fn check_capacity(
    bookings: &dyn BookingRepository,
    room: Option<&Room>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    attendee_count: i64,
    excluding_event_id: Option<&str>,
) -> Result<CapacityVerdict, AppError> {
    let Some(room) = room else {
        return Ok(CapacityVerdict::Ok);
    };

    let overlapping = bookings.find_overlapping(&room.id, start, end, excluding_event_id).await?;
    Ok(evaluate(room.capacity, &overlapping, attendee_count))
}
