use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::event::RoomEvent;

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next text message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[derive(Debug)]
pub enum SocketError {
    SendFailed(String),
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Binary/ping/pong; axum answers pings itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// A realtime subscriber: forwards one room's events to one client
///
/// The channel is receive-only for clients. Inbound frames are read (so
/// disconnects are noticed) and discarded. The connection never outlives the
/// room: it closes once `expires_in` has passed.
pub struct Connection {
    pub room_id: String,
    socket: Box<dyn SocketWrapper>,
    events: broadcast::Receiver<RoomEvent>,
    expires_in: Duration,
}

impl Connection {
    pub fn new(
        room_id: String,
        socket: Box<dyn SocketWrapper>,
        events: broadcast::Receiver<RoomEvent>,
        expires_in: Duration,
    ) -> Self {
        Self {
            room_id,
            socket,
            events,
            expires_in,
        }
    }

    /// Run the connection until the client leaves or the room is destroyed or expires
    pub async fn run(mut self) -> Result<(), SocketError> {
        let room_expired = tokio::time::sleep(self.expires_in);
        tokio::pin!(room_expired);

        loop {
            tokio::select! {
                // Expiry publishes nothing, the socket just closes
                _ = &mut room_expired => {
                    debug!(room_id = %self.room_id, "Room expired, closing realtime connection");
                    break;
                }

                // Room events (from the bus to the client)
                event = self.events.recv() => {
                    match event {
                        Ok(event) => {
                            let terminal = event.is_terminal();
                            match serde_json::to_string(&event) {
                                Ok(json) => self.socket.send_message(json).await?,
                                Err(e) => warn!(room_id = %self.room_id, error = %e, "Failed to encode room event"),
                            }
                            if terminal {
                                debug!(room_id = %self.room_id, "Room destroyed, closing realtime connection");
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(room_id = %self.room_id, skipped, "Realtime subscriber lagged, events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                // Inbound frames (from the client)
                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(_)) => debug!(room_id = %self.room_id, "Ignoring inbound realtime frame"),
                        Ok(None) => break, // Client disconnected
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}
