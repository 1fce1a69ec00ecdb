use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::token::token_from_headers;
use crate::room::models::validate_identifier;
use crate::shared::{AppError, AppState};

/// Identity of a participant whose token is a member of the requested room
///
/// Inserted into request extensions by `room_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomAuth {
    pub room_id: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    #[serde(rename = "roomId")]
    pub room_id: String,
}

/// Room membership middleware - checks the `roomId` query parameter against the token cookie.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::room_auth))
/// Handlers can then extract Extension(auth): Extension<RoomAuth>.
///
/// Every membership failure is `Unauthorized`, whether or not the room exists.
#[instrument(skip(state, req, next))]
pub async fn room_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Query(query) = Query::<RoomQuery>::try_from_uri(req.uri()).map_err(|_| {
        warn!(uri = %req.uri(), "Missing roomId query parameter");
        AppError::InvalidInput("missing roomId".to_string())
    })?;
    validate_identifier("room id", &query.room_id)?;

    let token = token_from_headers(req.headers()).ok_or_else(|| {
        warn!(room_id = %query.room_id, "Missing room token cookie");
        AppError::Unauthorized
    })?;

    let connected = state
        .room_service
        .is_token_connected(&query.room_id, &token)
        .await?;
    if !connected {
        warn!(room_id = %query.room_id, "Token is not a member of the room");
        return Err(AppError::Unauthorized);
    }

    debug!(room_id = %query.room_id, "Room membership verified");

    req.extensions_mut().insert(RoomAuth {
        room_id: query.room_id,
        token,
    });

    Ok(next.run(req).await)
}
