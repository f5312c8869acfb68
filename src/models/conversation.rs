use serde::{Deserialize, Serialize};

use crate::models::Booking;

/// Which point of the booking dialogue a session has reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Welcome,
    BookingRequest,
    DepartmentSelection,
    DoctorSelection,
    DateSelection,
    TimeSelection,
    ConfirmBooking,
    Completed,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::BookingRequest => "booking_request",
            Step::DepartmentSelection => "department_selection",
            Step::DoctorSelection => "doctor_selection",
            Step::DateSelection => "date_selection",
            Step::TimeSelection => "time_selection",
            Step::ConfirmBooking => "confirm_booking",
            Step::Completed => "completed",
        }
    }
}

/// Everything collected so far for one session's in-progress booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub patient_name: Option<String>,
    pub department: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub step: Step,
    pub booking_confirmed: bool,
    pub booking: Option<Booking>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            patient_name: None,
            department: None,
            doctor: None,
            date: None,
            time: None,
            step: Step::Welcome,
            booking_confirmed: false,
            booking: None,
        }
    }
}
