use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Doctor, NewDoctor};
use crate::services::{availability, slots};
use crate::state::AppState;

// GET /doctors
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_doctors(&db)?))
}

// POST /doctors
pub async fn add_doctor(
    State(state): State<Arc<AppState>>,
    Json(new_doctor): Json<NewDoctor>,
) -> Result<Json<Doctor>, AppError> {
    // Working hours must parse and must span a non-empty interval.
    let start = slots::parse_minutes(&new_doctor.available_start)?;
    let end = slots::parse_minutes(&new_doctor.available_end)?;
    if start >= end {
        return Err(AppError::Parse {
            field: "available_start",
            value: format!(
                "{} (must be before {})",
                new_doctor.available_start, new_doctor.available_end
            ),
        });
    }

    let db = state.db.lock().unwrap();
    let doctor = queries::insert_doctor(&db, &new_doctor)?;
    tracing::info!(doctor = %doctor.name, department = %doctor.department, "doctor added");
    Ok(Json(doctor))
}

// DELETE /doctors/:id
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    if !queries::delete_doctor(&db, id)? {
        return Err(AppError::NotFound(format!("doctor {id}")));
    }
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// GET /doctors/departments
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_departments(&db)?))
}

// GET /doctors/department/:department
pub async fn doctors_by_department(
    State(state): State<Arc<AppState>>,
    Path(department): Path<String>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let db = state.db.lock().unwrap();
    let doctors = queries::find_doctors_by_department(&db, &department)?;
    if doctors.is_empty() {
        return Err(AppError::NotFound(format!(
            "no doctors in {department} department"
        )));
    }
    Ok(Json(doctors))
}

// GET /doctors/:name/availability/:date
#[derive(Serialize)]
pub struct AvailabilityResponse {
    doctor_name: String,
    date: String,
    available: bool,
    available_slots: Vec<String>,
}

pub async fn doctor_availability(
    State(state): State<Arc<AppState>>,
    Path((name, date)): Path<(String, String)>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let db = state.db.lock().unwrap();

    let doctor = queries::get_doctor(&db, &name)?
        .ok_or_else(|| AppError::NotFound(format!("doctor {name}")))?;

    let available = availability::is_available(&db, &doctor.name, &date)?;
    let available_slots = if available {
        availability::available_slots(&db, &doctor.name, &date)?
    } else {
        vec![]
    };

    Ok(Json(AvailabilityResponse {
        doctor_name: doctor.name,
        date,
        available,
        available_slots,
    }))
}
