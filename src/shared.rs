use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;
use tracing::warn;

use crate::auth::RandomTokenGenerator;
use crate::config::AppConfig;
use crate::event::{EventBroadcaster, EventBus};
use crate::message::{MessageLog, MessageService};
use crate::room::{AdmissionGate, RoomRegistry, RoomService};
use crate::store::{KeyValueStore, StoreError};

/// Shared application state containing all dependencies
///
/// Built once at startup; every handler receives a clone.
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub message_service: Arc<MessageService>,
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires the room core on top of a store and an event bus
    pub fn new(store: Arc<dyn KeyValueStore>, event_bus: EventBus, config: &AppConfig) -> Self {
        let broadcaster: Arc<dyn EventBroadcaster> = Arc::new(event_bus.clone());
        let registry = Arc::new(RoomRegistry::new(Arc::clone(&store), config.room_ttl));
        let gate = AdmissionGate::new(
            Arc::clone(&registry),
            Arc::new(RandomTokenGenerator::default()),
        );
        let log = MessageLog::new(store, Arc::clone(&registry));

        Self {
            room_service: Arc::new(RoomService::new(
                registry,
                gate,
                Arc::clone(&broadcaster),
            )),
            message_service: Arc::new(MessageService::new(log, broadcaster)),
            event_bus,
        }
    }
}

/// Stable, client-facing error codes
///
/// `room-not-found` and `room-full` double as the lobby redirect reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    Unauthorized,
    InvalidInput,
    StoreUnavailable,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    // No detail: must not reveal whether the room exists
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::RoomNotFound => ErrorCode::RoomNotFound,
            AppError::RoomFull => ErrorCode::RoomFull,
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether the caller may reasonably retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::RoomFull => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::InvalidInput(msg) => json!({
                "error": self.code().as_str(),
                "message": msg,
            }),
            AppError::StoreUnavailable(msg) | AppError::Internal(msg) => {
                warn!(error = %msg, "Request failed on the server side");
                json!({ "error": self.code().as_str() })
            }
            _ => json!({ "error": self.code().as_str() }),
        };

        (status, Json(body)).into_response()
    }
}
