use serde::{Deserialize, Serialize};

use crate::models::Booking;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub done: bool,
    pub booking_details: Option<Booking>,
}
