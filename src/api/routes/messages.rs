use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::MessageEntry;

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageEntry>,
    pub count: usize,
}

pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state
        .message_log
        .read()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(MessagesResponse {
        count: messages.len(),
        messages,
    }))
}
