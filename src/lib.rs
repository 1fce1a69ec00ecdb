// Library crate for the duoroom server
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod auth;
pub mod config;
pub mod event;
pub mod message;
pub mod room;
pub mod shared;
pub mod store;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use config::AppConfig;
pub use event::{EventBroadcaster, EventBus, RoomEvent};
pub use room::{models::RoomModel, AdmissionDecision, AdmissionGate, RoomRegistry, RoomService};
pub use shared::{AppError, AppState};
pub use store::{InMemoryKeyValueStore, KeyValueStore, StoreError};
