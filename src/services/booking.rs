use chrono::Utc;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Atomic check-and-create. Callers hold the connection mutex, which
/// serializes the existence check against other creates; the UNIQUE
/// constraint on (doctor_name, date, time_slot) backstops it at the
/// database, so a duplicate can never produce two rows. Either path
/// surfaces as `Conflict`.
pub fn create(
    conn: &Connection,
    patient_name: &str,
    doctor_name: &str,
    date: &str,
    time_slot: &str,
) -> Result<Booking, AppError> {
    if queries::booking_exists(conn, doctor_name, date, time_slot)? {
        return Err(AppError::Conflict);
    }

    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        patient_name: patient_name.to_string(),
        doctor_name: doctor_name.to_string(),
        date: date.to_string(),
        time_slot: time_slot.to_string(),
        created_at: Utc::now().naive_utc(),
    };

    match queries::insert_booking(conn, &booking) {
        Ok(()) => Ok(booking),
        Err(e) if is_unique_violation(&e) => Err(AppError::Conflict),
        Err(e) => Err(AppError::Database(e)),
    }
}

pub fn cancel(conn: &Connection, id: &str) -> Result<(), AppError> {
    if queries::delete_booking(conn, id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

pub fn list_by_patient(conn: &Connection, patient_name: &str) -> Result<Vec<Booking>, AppError> {
    Ok(queries::bookings_for_patient(conn, patient_name)?)
}

pub fn list_all(conn: &Connection) -> Result<Vec<Booking>, AppError> {
    Ok(queries::list_bookings(conn)?)
}
