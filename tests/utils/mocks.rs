use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use duoroom::{
    event::{EventBroadcaster, RoomEvent},
    store::{BoundedAppend, InMemoryKeyValueStore, KeyTtl, KeyValueStore, StoreError},
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Broadcaster that remembers every published event
#[derive(Clone, Default)]
pub struct RecordingBroadcaster {
    events: Arc<RwLock<Vec<(String, RoomEvent)>>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(String, RoomEvent)> {
        self.events.read().await.clone()
    }

    pub async fn events_for(&self, room_id: &str) -> Vec<RoomEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(room, _)| room == room_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub async fn count_destroyed(&self, room_id: &str) -> usize {
        self.events_for(room_id)
            .await
            .iter()
            .filter(|event| event.is_terminal())
            .count()
    }
}

#[async_trait]
impl EventBroadcaster for RecordingBroadcaster {
    async fn publish(&self, room_id: &str, event: RoomEvent) {
        self.events.write().await.push((room_id.to_string(), event));
    }
}

/// Store whose every call fails, like an unreachable backend
pub struct FailingKeyValueStore;

fn down() -> StoreError {
    StoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(down())
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<(), StoreError> {
        Err(down())
    }

    async fn replace(&self, _key: &str, _value: &str) -> Result<bool, StoreError> {
        Err(down())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, StoreError> {
        Err(down())
    }

    async fn ttl(&self, _key: &str) -> Result<KeyTtl, StoreError> {
        Err(down())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, StoreError> {
        Err(down())
    }

    async fn list_create(&self, _key: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(down())
    }

    async fn list_append(&self, _key: &str, _value: &str) -> Result<Option<usize>, StoreError> {
        Err(down())
    }

    async fn list_append_bounded(
        &self,
        _key: &str,
        _value: &str,
        _max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        Err(down())
    }

    async fn list_range(&self, _key: &str) -> Result<Option<Vec<String>>, StoreError> {
        Err(down())
    }
}

/// In-memory store that answers every call after a fixed delay
pub struct SlowKeyValueStore {
    inner: InMemoryKeyValueStore,
    delay: Duration,
}

impl SlowKeyValueStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryKeyValueStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl KeyValueStore for SlowKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set(key, value, ttl).await
    }

    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.replace(key, value).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(keys).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.ttl(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.expire(key, ttl).await
    }

    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_create(key, ttl).await
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_append(key, value).await
    }

    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_append_bounded(key, value, max_len).await
    }

    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_range(key).await
    }
}

/// In-memory store whose TTL reads can be switched to time out
pub struct FlakyTtlStore {
    inner: Arc<InMemoryKeyValueStore>,
    fail_ttl: AtomicBool,
}

impl FlakyTtlStore {
    pub fn new(inner: Arc<InMemoryKeyValueStore>) -> Self {
        Self {
            inner,
            fail_ttl: AtomicBool::new(false),
        }
    }

    pub fn fail_ttl_reads(&self) {
        self.fail_ttl.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FlakyTtlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.inner.set(key, value, ttl).await
    }

    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.inner.replace(key, value).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.inner.delete(keys).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        if self.fail_ttl.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(Duration::from_millis(2000)));
        }
        self.inner.ttl(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.inner.expire(key, ttl).await
    }

    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.inner.list_create(key, ttl).await
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError> {
        self.inner.list_append(key, value).await
    }

    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        self.inner.list_append_bounded(key, value, max_len).await
    }

    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        self.inner.list_range(key).await
    }
}
