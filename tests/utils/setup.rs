use std::sync::Arc;
use std::time::Duration;

use duoroom::{
    auth::RandomTokenGenerator,
    message::{MessageLog, MessageService, MessageView, SendMessageRequest},
    room::{models::DEFAULT_ROOM_TTL, AdmissionDecision, AdmissionGate, RoomRegistry, RoomService},
    store::{InMemoryKeyValueStore, KeyValueStore},
    AppError,
};

use super::mocks::RecordingBroadcaster;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// The room core wired on an in-memory store and a recording broadcaster
pub struct TestSetup {
    pub store: Arc<InMemoryKeyValueStore>,
    pub registry: Arc<RoomRegistry>,
    pub rooms: Arc<RoomService>,
    pub messages: Arc<MessageService>,
    pub broadcaster: RecordingBroadcaster,
}

pub struct TestSetupBuilder {
    room_ttl: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            room_ttl: DEFAULT_ROOM_TTL,
        }
    }

    pub fn with_room_ttl(mut self, room_ttl: Duration) -> Self {
        self.room_ttl = room_ttl;
        self
    }

    pub fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let broadcaster = RecordingBroadcaster::new();
        let (rooms, messages, registry) =
            wire(store.clone(), Arc::new(broadcaster.clone()), self.room_ttl);

        TestSetup {
            store,
            registry,
            rooms,
            messages,
            broadcaster,
        }
    }
}

/// Wires room and message services over any store
pub fn wire(
    store: Arc<dyn KeyValueStore>,
    broadcaster: Arc<RecordingBroadcaster>,
    room_ttl: Duration,
) -> (Arc<RoomService>, Arc<MessageService>, Arc<RoomRegistry>) {
    let registry = Arc::new(RoomRegistry::new(store.clone(), room_ttl));
    let gate = AdmissionGate::new(
        registry.clone(),
        Arc::new(RandomTokenGenerator::default()),
    );
    let rooms = RoomService::new(registry.clone(), gate, broadcaster.clone());
    let messages = MessageService::new(MessageLog::new(store, registry.clone()), broadcaster);

    (Arc::new(rooms), Arc::new(messages), registry)
}

impl TestSetup {
    pub async fn create_room(&self) -> String {
        self.rooms.create_room().await.unwrap().id
    }

    /// Joins without a cookie and returns the minted token
    pub async fn join(&self, room_id: &str) -> String {
        match self.rooms.join(room_id, None).await.unwrap() {
            AdmissionDecision::Admitted { token } => token,
            other => panic!("expected admission into {room_id}, got {other:?}"),
        }
    }

    pub async fn send(
        &self,
        room_id: &str,
        token: &str,
        sender: &str,
        text: &str,
    ) -> Result<MessageView, AppError> {
        self.messages
            .send(
                room_id,
                token,
                SendMessageRequest {
                    sender: sender.to_string(),
                    text: text.to_string(),
                },
            )
            .await
    }
}
