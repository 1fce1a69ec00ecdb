use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::models::{Message, MessageView};
use crate::room::{models::RoomKeys, RoomRegistry};
use crate::shared::AppError;
use crate::store::KeyValueStore;

/// Append-only message history of a room, kept on the room's TTL
pub struct MessageLog {
    store: Arc<dyn KeyValueStore>,
    registry: Arc<RoomRegistry>,
}

impl MessageLog {
    pub fn new(store: Arc<dyn KeyValueStore>, registry: Arc<RoomRegistry>) -> Self {
        Self { store, registry }
    }

    /// Appends a message and realigns the history's TTL to the room's
    ///
    /// Returns the room's remaining lifetime after the append. Fails with
    /// `RoomNotFound` if the room is gone; never creates room keys.
    #[instrument(skip(self, message), fields(room_id = %message.room_id, message_id = %message.id))]
    pub async fn append(&self, message: &Message) -> Result<Duration, AppError> {
        let room_id = message.room_id.as_str();
        let keys = RoomKeys::for_room(room_id);

        if self.registry.get_room(room_id).await?.is_none() {
            return Err(AppError::RoomNotFound);
        }

        let payload =
            serde_json::to_string(message).map_err(|e| AppError::Internal(e.to_string()))?;

        // Only appends to a live history, so a destroyed room stays destroyed
        let Some(count) = self.store.list_append(&keys.messages, &payload).await? else {
            debug!("Message history gone, room was destroyed or expired");
            return Err(AppError::RoomNotFound);
        };

        // Never creates the marker or extends its expiry
        if !self.store.replace(&keys.history, &message.id).await? {
            debug!("History marker missing, leaving it absent");
        }

        match self.registry.remaining_ttl(room_id).await {
            Ok(ttl) => {
                debug!(count, ttl_ms = ttl.as_millis() as u64, "Message appended");
                Ok(ttl)
            }
            Err(AppError::RoomNotFound) => {
                // Destroy won the race; do not leave residue behind
                warn!("Room vanished during append, discarding history");
                self.store
                    .delete(&[keys.messages.clone(), keys.history.clone()])
                    .await?;
                Err(AppError::RoomNotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Lists messages in append order, redacted for `viewer_token`
    ///
    /// An empty history is `Ok(vec![])`; only a missing room is an error.
    #[instrument(skip(self, viewer_token))]
    pub async fn list(
        &self,
        room_id: &str,
        viewer_token: Option<&str>,
    ) -> Result<Vec<MessageView>, AppError> {
        if self.registry.get_room(room_id).await?.is_none() {
            return Err(AppError::RoomNotFound);
        }

        let keys = RoomKeys::for_room(room_id);
        let items = self
            .store
            .list_range(&keys.messages)
            .await?
            .unwrap_or_default();

        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_str::<Message>(&item) {
                Ok(message) => messages.push(message.view_for(viewer_token)),
                Err(e) => warn!(room_id = %room_id, error = %e, "Skipping unreadable message"),
            }
        }

        debug!(room_id = %room_id, count = messages.len(), "Messages listed");
        Ok(messages)
    }
}
