// Public API - what other modules can use
pub use admission::{AdmissionDecision, AdmissionGate};
pub use handlers::{create_room, destroy_room, get_ttl, join_room};
pub use registry::{AdmitResult, RoomRegistry};
pub use service::RoomService;
pub use types::{CreateRoomResponse, JoinRoomResponse, TtlResponse};

// Internal modules
mod admission;
mod handlers;
pub mod models;
mod registry;
mod service;
mod types;
