use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::models::{ChatReply, ChatRequest};
use crate::services::conversation;
use crate::state::AppState;

/// The conversational entry point. Never fails outward: transition errors
/// are turned into an apology reply inside the engine.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatReply> {
    let reply = conversation::process_message(&state, &request.session_id, &request.message).await;
    Json(reply)
}
