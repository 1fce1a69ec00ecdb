use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    log::MessageLog,
    models::{Message, MessageView},
    types::SendMessageRequest,
};
use crate::event::{EventBroadcaster, RoomEvent};
use crate::shared::AppError;

/// Message operations for authenticated room members
pub struct MessageService {
    log: MessageLog,
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl MessageService {
    pub fn new(log: MessageLog, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        Self { log, broadcaster }
    }

    /// Stores a message, then broadcasts its public fields to the room
    ///
    /// The returned view still carries the author's token.
    #[instrument(skip(self, token, request))]
    pub async fn send(
        &self,
        room_id: &str,
        token: &str,
        request: SendMessageRequest,
    ) -> Result<MessageView, AppError> {
        request.validate()?;

        let message = Message::new(room_id, token, request.sender, request.text);
        self.log.append(&message).await?;

        self.broadcaster
            .publish(room_id, RoomEvent::MessageArrived(message.public_view()))
            .await;

        info!(room_id = %room_id, message_id = %message.id, "Message sent");
        Ok(message.view_for(Some(token)))
    }

    /// Lists the room's history as seen by `token`
    pub async fn list(&self, room_id: &str, token: &str) -> Result<Vec<MessageView>, AppError> {
        self.log.list(room_id, Some(token)).await
    }
}
