use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub patient_name: String,
    pub doctor_name: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    /// Slot start time as `HH:MM`, on the doctor's 20-minute grid.
    pub time_slot: String,
    pub created_at: NaiveDateTime,
}
