use chrono::NaiveTime;
use chrono::Timelike;

use crate::errors::AppError;

/// Appointment length for every doctor.
pub const SLOT_MINUTES: u32 = 20;

/// Minutes since midnight for an `HH:MM` string.
pub fn parse_minutes(value: &str) -> Result<u32, AppError> {
    let time = NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| AppError::Parse {
        field: "time",
        value: value.to_string(),
    })?;
    Ok(time.hour() * 60 + time.minute())
}

fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The ordered slot grid between `start` and `end`: every `slot_minutes`
/// step whose start time is strictly before `end`. The boundary check is on
/// the slot's start only — a final slot may run past `end`. Arithmetic is
/// done on minutes since midnight, so stepping can never wrap past the day.
pub fn time_slots(start: &str, end: &str, slot_minutes: u32) -> Result<Vec<String>, AppError> {
    let start_min = parse_minutes(start)?;
    let end_min = parse_minutes(end)?;

    let mut slots = vec![];
    let mut current = start_min;
    while current < end_min {
        slots.push(format_minutes(current));
        current += slot_minutes;
    }
    Ok(slots)
}
