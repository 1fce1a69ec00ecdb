use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{info, instrument};

use super::{
    admission::AdmissionDecision,
    types::{CreateRoomResponse, JoinRoomResponse, TtlResponse},
};
use crate::auth::{token_cookie, token_from_headers, RoomAuth};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /room/create
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let room = state.room_service.create_room().await?;

    Ok(Json(CreateRoomResponse { room_id: room.id }))
}

/// HTTP handler for entering a room
///
/// GET /room/:room_id/join
/// A token cookie from an earlier join is honoured; new members get a fresh
/// token both in the body and as a cookie.
#[instrument(name = "join_room", skip(state, headers))]
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let existing = token_from_headers(&headers);

    match state.room_service.join(&room_id, existing.as_deref()).await? {
        AdmissionDecision::Admitted { token } => {
            info!(room_id = %room_id, "Join accepted");
            let cookie = token_cookie(&token);
            Ok((
                [(header::SET_COOKIE, cookie)],
                Json(JoinRoomResponse { room_id, token }),
            )
                .into_response())
        }
        AdmissionDecision::Full => Err(AppError::RoomFull),
        AdmissionDecision::RoomNotFound => Err(AppError::RoomNotFound),
    }
}

/// HTTP handler for the room's remaining lifetime
///
/// GET /room/ttl?roomId=...
#[instrument(name = "get_ttl", skip(state, auth), fields(room_id = %auth.room_id))]
pub async fn get_ttl(
    State(state): State<AppState>,
    Extension(auth): Extension<RoomAuth>,
) -> Result<Json<TtlResponse>, AppError> {
    let ttl = state.room_service.remaining_ttl(&auth.room_id).await?;

    Ok(Json(TtlResponse { ttl: ttl.as_secs() }))
}

/// HTTP handler for destroying a room
///
/// DELETE /room?roomId=...
#[instrument(name = "destroy_room", skip(state, auth), fields(room_id = %auth.room_id))]
pub async fn destroy_room(
    State(state): State<AppState>,
    Extension(auth): Extension<RoomAuth>,
) -> Result<StatusCode, AppError> {
    state.room_service.destroy(&auth.room_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/room/create", post(create_room))
            .route("/room/:room_id/join", get(join_room))
            .with_state(state)
    }

    fn join_request(room_id: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(format!("/room/{room_id}/join"));
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_handler() {
        let state = AppStateBuilder::new().build();

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/room/create")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let created: CreateRoomResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(created.room_id.len(), 32);
        assert!(state
            .room_service
            .remaining_ttl(&created.room_id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_join_sets_cookie() {
        let state = AppStateBuilder::new().build();
        let room = state.room_service.create_room().await.unwrap();

        let response = app(state).oneshot(join_request(&room.id, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let joined: JoinRoomResponse = serde_json::from_value(body_json(response).await).unwrap();

        assert_eq!(joined.room_id, room.id);
        assert!(cookie.starts_with(&format!("x-auth-token={}", joined.token)));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_third_join_is_conflict_but_member_can_return() {
        let state = AppStateBuilder::new().build();
        let room = state.room_service.create_room().await.unwrap();
        let app = app(state);

        let first = app
            .clone()
            .oneshot(join_request(&room.id, None))
            .await
            .unwrap();
        let first: JoinRoomResponse = serde_json::from_value(body_json(first).await).unwrap();
        app.clone()
            .oneshot(join_request(&room.id, None))
            .await
            .unwrap();

        let third = app
            .clone()
            .oneshot(join_request(&room.id, None))
            .await
            .unwrap();
        assert_eq!(third.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(third).await["error"], "room-full");

        let cookie = format!("x-auth-token={}", first.token);
        let again = app
            .oneshot(join_request(&room.id, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::OK);
        let again: JoinRoomResponse = serde_json::from_value(body_json(again).await).unwrap();
        assert_eq!(again.token, first.token);
    }

    #[tokio::test]
    async fn test_join_missing_room() {
        let state = AppStateBuilder::new().build();

        let response = app(state)
            .oneshot(join_request("doesnotexist", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "room-not-found");
    }

    #[tokio::test]
    async fn test_ttl_and_destroy_for_member() {
        let state = AppStateBuilder::new()
            .with_room_ttl(std::time::Duration::from_secs(120))
            .build();
        let room = state.room_service.create_room().await.unwrap();
        let app = Router::new()
            .route("/room/ttl", get(get_ttl))
            .route("/room", axum::routing::delete(destroy_room))
            .layer(Extension(RoomAuth {
                room_id: room.id.clone(),
                token: "alice".to_string(),
            }))
            .with_state(state);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/room/ttl").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ttl: TtlResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert!(ttl.ttl > 110 && ttl.ttl <= 120);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/room")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(Request::builder().uri("/room/ttl").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
