use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{BoundedAppend, KeyTtl, KeyValueStore, StoreError};

/// Decorator that bounds every store call by a fixed timeout
///
/// A call that does not finish in time is abandoned and reported as
/// `StoreError::Timeout`. Each wrapped call is a single store operation, so
/// abandoning it never leaves more than that one operation's effect behind.
pub struct TimeoutKeyValueStore {
    inner: Arc<dyn KeyValueStore>,
    limit: Duration,
}

impl TimeoutKeyValueStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, limit_ms = self.limit.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for TimeoutKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        self.bounded("set", self.inner.set(key, value, ttl)).await
    }

    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.bounded("replace", self.inner.replace(key, value)).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.bounded("delete", self.inner.delete(keys)).await
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        self.bounded("ttl", self.inner.ttl(key)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.bounded("expire", self.inner.expire(key, ttl)).await
    }

    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.bounded("list_create", self.inner.list_create(key, ttl))
            .await
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError> {
        self.bounded("list_append", self.inner.list_append(key, value))
            .await
    }

    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        self.bounded(
            "list_append_bounded",
            self.inner.list_append_bounded(key, value, max_len),
        )
        .await
    }

    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        self.bounded("list_range", self.inner.list_range(key)).await
    }
}
