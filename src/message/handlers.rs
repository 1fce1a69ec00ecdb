use axum::{extract::State, Extension, Json};
use tracing::{info, instrument};

use super::types::{MessagesResponse, SendMessageRequest};
use super::MessageView;
use crate::auth::RoomAuth;
use crate::shared::{AppError, AppState};

/// HTTP handler for posting a message
///
/// POST /messages?roomId=...
/// Requires room membership (enforced by `room_auth`)
#[instrument(name = "send_message", skip(state, auth, request), fields(room_id = %auth.room_id))]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<RoomAuth>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<MessageView>, AppError> {
    let message = state
        .message_service
        .send(&auth.room_id, &auth.token, request)
        .await?;

    Ok(Json(message))
}

/// HTTP handler for reading a room's history
///
/// GET /messages?roomId=...
#[instrument(name = "list_messages", skip(state, auth), fields(room_id = %auth.room_id))]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<RoomAuth>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .message_service
        .list(&auth.room_id, &auth.token)
        .await?;

    info!(count = messages.len(), "Messages listed");
    Ok(Json(MessagesResponse { messages }))
}
