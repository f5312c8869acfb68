use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{Booking, Doctor, NewDoctor};

// ── Doctors ──

fn parse_doctor_row(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        available_start: row.get(3)?,
        available_end: row.get(4)?,
        off_day: row.get(5)?,
    })
}

const DOCTOR_COLUMNS: &str = "id, name, department, available_start, available_end, off_day";

pub fn insert_doctor(conn: &Connection, doctor: &NewDoctor) -> anyhow::Result<Doctor> {
    conn.execute(
        "INSERT INTO doctors (name, department, available_start, available_end, off_day)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doctor.name,
            doctor.department,
            doctor.available_start,
            doctor.available_end,
            doctor.off_day,
        ],
    )?;

    let id = conn.last_insert_rowid();
    Ok(Doctor {
        id,
        name: doctor.name.clone(),
        department: doctor.department.clone(),
        available_start: doctor.available_start.clone(),
        available_end: doctor.available_end.clone(),
        off_day: doctor.off_day.clone(),
    })
}

pub fn delete_doctor(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM doctors WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_doctors(conn: &Connection) -> anyhow::Result<Vec<Doctor>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY id"))?;
    let rows = stmt.query_map([], parse_doctor_row)?;

    let mut doctors = vec![];
    for row in rows {
        doctors.push(row?);
    }
    Ok(doctors)
}

pub fn count_doctors(conn: &Connection) -> anyhow::Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM doctors", [], |row| row.get(0))?;
    Ok(count)
}

pub fn list_departments(conn: &Connection) -> anyhow::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT department FROM doctors ORDER BY department")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut departments = vec![];
    for row in rows {
        departments.push(row?);
    }
    Ok(departments)
}

/// Case-insensitive substring match on department.
pub fn find_doctors_by_department(
    conn: &Connection,
    department: &str,
) -> anyhow::Result<Vec<Doctor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors
         WHERE LOWER(department) LIKE '%' || LOWER(?1) || '%' ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![department], parse_doctor_row)?;

    let mut doctors = vec![];
    for row in rows {
        doctors.push(row?);
    }
    Ok(doctors)
}

/// Case-insensitive substring match on name; first hit wins (lowest id).
pub fn find_doctor_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<Doctor>> {
    let result = conn.query_row(
        &format!(
            "SELECT {DOCTOR_COLUMNS} FROM doctors
             WHERE LOWER(name) LIKE '%' || LOWER(?1) || '%' ORDER BY id LIMIT 1"
        ),
        params![name],
        parse_doctor_row,
    );

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Exact-name lookup, used wherever a doctor has already been selected.
pub fn get_doctor(conn: &Connection, name: &str) -> anyhow::Result<Option<Doctor>> {
    let result = conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE name = ?1"),
        params![name],
        parse_doctor_row,
    );

    match result {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Bookings ──

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    let created_at_str: String = row.get(5)?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        doctor_name: row.get(2)?,
        date: row.get(3)?,
        time_slot: row.get(4)?,
        created_at,
    })
}

const BOOKING_COLUMNS: &str = "id, patient_name, doctor_name, date, time_slot, created_at";

/// Raw insert. The `(doctor_name, date, time_slot)` UNIQUE constraint is the
/// database-level guard against double booking; callers map the constraint
/// violation to a conflict.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> rusqlite::Result<()> {
    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO bookings (id, patient_name, doctor_name, date, time_slot, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            booking.id,
            booking.patient_name,
            booking.doctor_name,
            booking.date,
            booking.time_slot,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn booking_exists(
    conn: &Connection,
    doctor_name: &str,
    date: &str,
    time_slot: &str,
) -> anyhow::Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM bookings
         WHERE doctor_name = ?1 AND date = ?2 AND time_slot = ?3",
        params![doctor_name, date, time_slot],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Time slots already taken for a doctor on a date, in grid order.
pub fn booked_slots(conn: &Connection, doctor_name: &str, date: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM bookings
         WHERE doctor_name = ?1 AND date = ?2 ORDER BY time_slot",
    )?;
    let rows = stmt.query_map(params![doctor_name, date], |row| row.get(0))?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn bookings_for_patient(conn: &Connection, patient_name: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE patient_name = ?1 ORDER BY rowid"
    ))?;
    let rows = stmt.query_map(params![patient_name], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY rowid"))?;
    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn sample_doctor(name: &str, department: &str) -> NewDoctor {
        NewDoctor {
            name: name.to_string(),
            department: department.to_string(),
            available_start: "09:00".to_string(),
            available_end: "17:00".to_string(),
            off_day: Some("Friday".to_string()),
        }
    }

    #[test]
    fn test_insert_and_find_doctor() {
        let conn = setup_db();
        let doc = insert_doctor(&conn, &sample_doctor("Dr. Sarah Chen", "Cardiology")).unwrap();
        assert!(doc.id > 0);

        let found = find_doctor_by_name(&conn, "sarah").unwrap().unwrap();
        assert_eq!(found.name, "Dr. Sarah Chen");

        assert!(find_doctor_by_name(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_find_doctor_first_hit_wins() {
        let conn = setup_db();
        insert_doctor(&conn, &sample_doctor("Dr. Adam Smith", "Cardiology")).unwrap();
        insert_doctor(&conn, &sample_doctor("Dr. Jane Smith", "Neurology")).unwrap();

        let found = find_doctor_by_name(&conn, "smith").unwrap().unwrap();
        assert_eq!(found.name, "Dr. Adam Smith");
    }

    #[test]
    fn test_departments_distinct() {
        let conn = setup_db();
        insert_doctor(&conn, &sample_doctor("Dr. A", "Cardiology")).unwrap();
        insert_doctor(&conn, &sample_doctor("Dr. B", "Cardiology")).unwrap();
        insert_doctor(&conn, &sample_doctor("Dr. C", "Neurology")).unwrap();

        let departments = list_departments(&conn).unwrap();
        assert_eq!(departments, vec!["Cardiology", "Neurology"]);
    }

    #[test]
    fn test_find_doctors_by_department_case_insensitive() {
        let conn = setup_db();
        insert_doctor(&conn, &sample_doctor("Dr. A", "Cardiology")).unwrap();

        let found = find_doctors_by_department(&conn, "CARDIO").unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_unique_slot_constraint() {
        let conn = setup_db();
        let now = Utc::now().naive_utc();

        let booking = Booking {
            id: "b-1".to_string(),
            patient_name: "Alice".to_string(),
            doctor_name: "Dr. A".to_string(),
            date: "2025-06-16".to_string(),
            time_slot: "09:20".to_string(),
            created_at: now,
        };
        insert_booking(&conn, &booking).unwrap();

        let duplicate = Booking {
            id: "b-2".to_string(),
            patient_name: "Bob".to_string(),
            ..booking.clone()
        };
        let err = insert_booking(&conn, &duplicate).unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        ));
    }

    #[test]
    fn test_bookings_for_patient_insertion_order() {
        let conn = setup_db();
        let now = Utc::now().naive_utc();

        for (id, slot) in [("b-1", "10:00"), ("b-2", "09:00")] {
            insert_booking(
                &conn,
                &Booking {
                    id: id.to_string(),
                    patient_name: "Alice".to_string(),
                    doctor_name: "Dr. A".to_string(),
                    date: "2025-06-16".to_string(),
                    time_slot: slot.to_string(),
                    created_at: now,
                },
            )
            .unwrap();
        }

        let bookings = bookings_for_patient(&conn, "Alice").unwrap();
        let ids: Vec<&str> = bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b-1", "b-2"]);
    }
}
