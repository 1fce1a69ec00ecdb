use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::room_auth;
use crate::message::{list_messages, send_message};
use crate::room::{create_room, destroy_room, get_ttl, join_room};
use crate::shared::AppState;
use crate::websockets::realtime_handler;

/// Builds the full HTTP surface on top of a wired `AppState`
pub fn build_router(app_state: AppState) -> Router {
    // Everything here requires a token that is a member of ?roomId=
    let member_routes = Router::new()
        .route("/room", delete(destroy_room))
        .route("/room/ttl", get(get_ttl))
        .route("/messages", get(list_messages).post(send_message))
        .route("/realtime", get(realtime_handler))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            room_auth,
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/room/create", post(create_room))
        .route("/room/:room_id/join", get(join_room))
        .merge(member_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(app_state)
}
