use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    Extension,
};
use tracing::{info, instrument, warn};

use super::socket::Connection;
use crate::auth::RoomAuth;
use crate::shared::{AppError, AppState};

/// Realtime endpoint for room members
///
/// GET /realtime?roomId=... (membership checked by `room_auth`)
/// The subscription is taken before the upgrade, so no event published after
/// a successful handshake can be missed. The connection closes when the room
/// expires and the room's channel is released once nobody listens.
#[instrument(name = "realtime", skip(ws, state, auth), fields(room_id = %auth.room_id))]
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(auth): Extension<RoomAuth>,
) -> Result<Response, AppError> {
    let expires_in = state.room_service.remaining_ttl(&auth.room_id).await?;
    let events = state.event_bus.subscribe_to_room(&auth.room_id).await;
    let room_id = auth.room_id;

    info!(
        room_id = %room_id,
        expires_in_secs = expires_in.as_secs(),
        "Realtime connection requested"
    );

    let event_bus = state.event_bus.clone();
    Ok(ws.on_upgrade(move |socket| async move {
        let connection = Connection::new(room_id.clone(), Box::new(socket), events, expires_in);

        match connection.run().await {
            Ok(()) => info!(room_id = %room_id, "Realtime connection closed cleanly"),
            Err(e) => warn!(room_id = %room_id, error = ?e, "Realtime connection error"),
        }

        event_bus.release_room(&room_id).await;
    }))
}
