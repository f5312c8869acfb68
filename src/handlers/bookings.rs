use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::booking;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BookingRequest {
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub time_slot: String,
}

// POST /bookings — 409 when the slot is taken.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();
    let created = booking::create(
        &db,
        &request.patient_name,
        &request.doctor_name,
        &request.date,
        &request.time_slot,
    )?;
    tracing::info!(
        booking = %created.id,
        doctor = %created.doctor_name,
        date = %created.date,
        slot = %created.time_slot,
        "booking created"
    );
    Ok(Json(created))
}

// GET /bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(booking::list_all(&db)?))
}

// GET /bookings/patient/:name
pub async fn bookings_for_patient(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(booking::list_by_patient(&db, &name)?))
}

// DELETE /bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db.lock().unwrap();
    booking::cancel(&db, &id)?;
    tracing::info!(booking = %id, "booking cancelled");
    Ok(Json(serde_json::json!({ "cancelled": id })))
}
