use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{
    admission::{AdmissionDecision, AdmissionGate},
    models::{validate_identifier, RoomModel},
    registry::RoomRegistry,
};
use crate::event::{EventBroadcaster, RoomEvent};
use crate::shared::AppError;

/// Service for room lifecycle operations exposed over HTTP
pub struct RoomService {
    registry: Arc<RoomRegistry>,
    gate: AdmissionGate,
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl RoomService {
    pub fn new(
        registry: Arc<RoomRegistry>,
        gate: AdmissionGate,
        broadcaster: Arc<dyn EventBroadcaster>,
    ) -> Self {
        Self {
            registry,
            gate,
            broadcaster,
        }
    }

    pub async fn create_room(&self) -> Result<RoomModel, AppError> {
        self.registry.create_room().await
    }

    /// Lets a client into a room, re-using its token when it is already a member
    pub async fn join(
        &self,
        room_id: &str,
        existing_token: Option<&str>,
    ) -> Result<AdmissionDecision, AppError> {
        self.gate.admit(room_id, existing_token).await
    }

    #[instrument(skip(self))]
    pub async fn remaining_ttl(&self, room_id: &str) -> Result<Duration, AppError> {
        validate_identifier("room id", room_id)?;
        self.registry.remaining_ttl(room_id).await
    }

    pub async fn is_token_connected(&self, room_id: &str, token: &str) -> Result<bool, AppError> {
        self.registry.is_token_connected(room_id, token).await
    }

    /// Destroys a room and tells its subscribers
    ///
    /// Only the call that actually removed the room publishes the destroy
    /// event, so concurrent destroys announce it once.
    #[instrument(skip(self))]
    pub async fn destroy(&self, room_id: &str) -> Result<(), AppError> {
        if !self.registry.destroy_room(room_id).await? {
            debug!(room_id = %room_id, "Nothing to destroy");
            return Ok(());
        }

        self.broadcaster
            .publish(room_id, RoomEvent::destroyed())
            .await;
        info!(room_id = %room_id, "Room destruction broadcast");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RandomTokenGenerator;
    use crate::store::InMemoryKeyValueStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBroadcaster {
        events: Mutex<Vec<(String, RoomEvent)>>,
    }

    #[async_trait]
    impl EventBroadcaster for RecordingBroadcaster {
        async fn publish(&self, room_id: &str, event: RoomEvent) {
            self.events
                .lock()
                .unwrap()
                .push((room_id.to_string(), event));
        }
    }

    fn service() -> (Arc<RecordingBroadcaster>, RoomService) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let registry = Arc::new(RoomRegistry::new(store, Duration::from_secs(600)));
        let gate = AdmissionGate::new(
            registry.clone(),
            Arc::new(RandomTokenGenerator::default()),
        );
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        (
            broadcaster.clone(),
            RoomService::new(registry, gate, broadcaster),
        )
    }

    #[tokio::test]
    async fn test_join_then_rejoin_with_same_token() {
        let (_, service) = service();
        let room = service.create_room().await.unwrap();

        let AdmissionDecision::Admitted { token } = service.join(&room.id, None).await.unwrap()
        else {
            panic!("first join should be admitted");
        };

        assert_eq!(
            service.join(&room.id, Some(&token)).await.unwrap(),
            AdmissionDecision::Admitted {
                token: token.clone()
            }
        );
        assert!(service.is_token_connected(&room.id, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_destroy_publishes_once() {
        let (broadcaster, service) = service();
        let room = service.create_room().await.unwrap();

        service.destroy(&room.id).await.unwrap();
        service.destroy(&room.id).await.unwrap();

        let events = broadcaster.events.lock().unwrap();
        assert_eq!(*events, vec![(room.id.clone(), RoomEvent::destroyed())]);
    }

    #[tokio::test]
    async fn test_destroy_unknown_room_is_silent() {
        let (broadcaster, service) = service();

        service.destroy("never-existed").await.unwrap();

        assert!(broadcaster.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ttl_of_missing_room() {
        let (_, service) = service();

        assert!(matches!(
            service.remaining_ttl("missing").await,
            Err(AppError::RoomNotFound)
        ));
        assert!(matches!(
            service.remaining_ttl("bad id!").await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
