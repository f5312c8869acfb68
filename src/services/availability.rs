use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::slots::{self, SLOT_MINUTES};

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| AppError::Parse {
        field: "date",
        value: value.to_string(),
    })
}

/// Free slots for a doctor on a date: the full working-hours grid minus the
/// slots already booked for that exact (doctor, date) pair, grid order
/// preserved. An unknown doctor yields an empty list; the HTTP surface
/// reports missing doctors separately.
pub fn available_slots(
    conn: &Connection,
    doctor_name: &str,
    date: &str,
) -> Result<Vec<String>, AppError> {
    let Some(doctor) = queries::get_doctor(conn, doctor_name)? else {
        return Ok(vec![]);
    };

    let grid = slots::time_slots(&doctor.available_start, &doctor.available_end, SLOT_MINUTES)?;
    let booked = queries::booked_slots(conn, doctor_name, date)?;

    Ok(grid.into_iter().filter(|s| !booked.contains(s)).collect())
}

/// Whether the doctor works on this date at all. False on the configured
/// off-day, and false for an unknown doctor (a missing doctor cannot be
/// available).
pub fn is_available(conn: &Connection, doctor_name: &str, date: &str) -> Result<bool, AppError> {
    let Some(doctor) = queries::get_doctor(conn, doctor_name)? else {
        return Ok(false);
    };

    let day_name = parse_date(date)?.format("%A").to_string();
    match &doctor.off_day {
        Some(off_day) => Ok(!off_day.eq_ignore_ascii_case(&day_name)),
        None => Ok(true),
    }
}

/// Up to 3 free slots closest to the preferred time. The preferred slot
/// itself, if free, is returned alone. Ties on distance resolve to the
/// earlier time (stable sort over the ascending grid).
pub fn suggest_alternatives(
    conn: &Connection,
    doctor_name: &str,
    date: &str,
    preferred_time: &str,
) -> Result<Vec<String>, AppError> {
    let available = available_slots(conn, doctor_name, date)?;
    if available.is_empty() {
        return Ok(vec![]);
    }

    if available.iter().any(|s| s == preferred_time) {
        return Ok(vec![preferred_time.to_string()]);
    }

    let preferred = slots::parse_minutes(preferred_time)?;
    let mut ranked: Vec<(u32, String)> = available
        .into_iter()
        .map(|slot| {
            let minutes = slots::parse_minutes(&slot)?;
            Ok((preferred.abs_diff(minutes), slot))
        })
        .collect::<Result<_, AppError>>()?;
    ranked.sort_by_key(|(distance, _)| *distance);

    Ok(ranked.into_iter().take(3).map(|(_, slot)| slot).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, NewDoctor};

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_doctor(
            &conn,
            &NewDoctor {
                name: "Dr. Smith".to_string(),
                department: "Cardiology".to_string(),
                available_start: "09:00".to_string(),
                available_end: "10:00".to_string(),
                off_day: Some("Friday".to_string()),
            },
        )
        .unwrap();
        conn
    }

    fn book(conn: &Connection, slot: &str) {
        queries::insert_booking(
            conn,
            &Booking {
                id: format!("b-{slot}"),
                patient_name: "Alice".to_string(),
                doctor_name: "Dr. Smith".to_string(),
                date: "2025-06-16".to_string(),
                time_slot: slot.to_string(),
                created_at: chrono::Utc::now().naive_utc(),
            },
        )
        .unwrap();
    }

    #[test]
    fn test_full_grid_when_nothing_booked() {
        let conn = setup_db();
        let slots = available_slots(&conn, "Dr. Smith", "2025-06-16").unwrap();
        assert_eq!(slots, vec!["09:00", "09:20", "09:40"]);
    }

    #[test]
    fn test_booked_slot_is_excluded() {
        let conn = setup_db();
        book(&conn, "09:20");
        let slots = available_slots(&conn, "Dr. Smith", "2025-06-16").unwrap();
        assert_eq!(slots, vec!["09:00", "09:40"]);
    }

    #[test]
    fn test_booking_on_other_date_does_not_leak() {
        let conn = setup_db();
        book(&conn, "09:20");
        let slots = available_slots(&conn, "Dr. Smith", "2025-06-17").unwrap();
        assert_eq!(slots, vec!["09:00", "09:20", "09:40"]);
    }

    #[test]
    fn test_unknown_doctor_has_no_slots() {
        let conn = setup_db();
        let slots = available_slots(&conn, "Dr. Nobody", "2025-06-16").unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_off_day() {
        let conn = setup_db();
        // 2025-06-20 is a Friday, Dr. Smith's off-day.
        assert!(!is_available(&conn, "Dr. Smith", "2025-06-20").unwrap());
        // 2025-06-16 is a Monday.
        assert!(is_available(&conn, "Dr. Smith", "2025-06-16").unwrap());
    }

    #[test]
    fn test_unknown_doctor_is_unavailable() {
        let conn = setup_db();
        assert!(!is_available(&conn, "Dr. Nobody", "2025-06-16").unwrap());
    }

    #[test]
    fn test_malformed_date_is_a_parse_error() {
        let conn = setup_db();
        let err = is_available(&conn, "Dr. Smith", "June 16").unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_alternatives_prefer_exact_match() {
        let conn = setup_db();
        let alts = suggest_alternatives(&conn, "Dr. Smith", "2025-06-16", "09:20").unwrap();
        assert_eq!(alts, vec!["09:20"]);
    }

    #[test]
    fn test_alternatives_closest_first_ties_ascending() {
        let conn = setup_db();
        book(&conn, "09:20");
        // Preferred 09:20 is taken; 09:00 and 09:40 are both 20 minutes
        // away, so the earlier slot ranks first.
        let alts = suggest_alternatives(&conn, "Dr. Smith", "2025-06-16", "09:20").unwrap();
        assert_eq!(alts, vec!["09:00", "09:40"]);
    }

    #[test]
    fn test_alternatives_capped_at_three() {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_doctor(
            &conn,
            &NewDoctor {
                name: "Dr. Smith".to_string(),
                department: "Cardiology".to_string(),
                available_start: "09:00".to_string(),
                available_end: "17:00".to_string(),
                off_day: None,
            },
        )
        .unwrap();

        let alts = suggest_alternatives(&conn, "Dr. Smith", "2025-06-16", "12:10").unwrap();
        assert_eq!(alts.len(), 3);
        assert_eq!(alts[0], "12:00");
    }

    #[test]
    fn test_alternatives_empty_when_fully_booked() {
        let conn = setup_db();
        for slot in ["09:00", "09:20", "09:40"] {
            book(&conn, slot);
        }
        let alts = suggest_alternatives(&conn, "Dr. Smith", "2025-06-16", "09:20").unwrap();
        assert!(alts.is_empty());
    }
}
