use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::{events::RoomEvent, EventBroadcaster};

const DEFAULT_ROOM_CAPACITY: usize = 100;

/// In-process event bus with one broadcast channel per room
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }

    /// Creates a bus whose room channels buffer up to `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Emits an event to all current subscribers of a specific room
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) {
        let room_channels = self.room_channels.read().await;

        match room_channels.get(room_id) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        room_id = %room_id,
                        receivers = receiver_count,
                        "Room event emitted"
                    );
                }
                Err(_) => {
                    debug!(room_id = %room_id, "Room event emitted with no receivers");
                }
            },
            // Nobody ever subscribed, so nobody can miss it
            None => debug!(room_id = %room_id, "No room channel, event dropped"),
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!(room_id = %room_id, "Creating new room channel for subscription");
                broadcast::channel(self.capacity).0
            })
            .subscribe()
    }

    /// Drops a room's channel; subscribers drain what is buffered, then see it closed
    pub async fn close_room(&self, room_id: &str) {
        if self.room_channels.write().await.remove(room_id).is_some() {
            debug!(room_id = %room_id, "Room channel closed");
        }
    }

    /// Drops a room's channel once its last subscriber has gone
    ///
    /// Rooms that expire never publish a terminal event, so their channels
    /// are reclaimed here when the last realtime connection ends.
    pub async fn release_room(&self, room_id: &str) {
        let mut room_channels = self.room_channels.write().await;
        if room_channels
            .get(room_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            room_channels.remove(room_id);
            debug!(room_id = %room_id, "Idle room channel released");
        }
    }

    /// Number of rooms that currently have a channel
    pub async fn room_count(&self) -> usize {
        self.room_channels.read().await.len()
    }
}

#[async_trait]
impl EventBroadcaster for EventBus {
    async fn publish(&self, room_id: &str, event: RoomEvent) {
        let terminal = event.is_terminal();
        self.emit_to_room(room_id, event).await;
        if terminal {
            self.close_room(room_id).await;
        }
    }
}
