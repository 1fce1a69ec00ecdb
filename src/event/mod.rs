// Room-scoped event publishing
//
// The room core only knows the `EventBroadcaster` seam; `EventBus` is the
// in-process implementation that realtime connections subscribe to.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::RoomEvent;

// Internal modules
mod bus;
mod events;

use async_trait::async_trait;

/// Fire-and-forget delivery of room events to current subscribers
///
/// Publishing never fails from the caller's point of view and returns no
/// delivery confirmation.
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn publish(&self, room_id: &str, event: RoomEvent);
}
