use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

use super::{BoundedAppend, KeyTtl, KeyValueStore, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > now)
    }
}

/// In-memory implementation of KeyValueStore for development and testing
///
/// Expiry is measured on tokio's clock, so tests can pause and advance time.
/// Expired entries behave exactly like missing ones and are purged lazily.
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyValueStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of live keys (useful for asserting nothing leaked)
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| e.is_live(now)).count())
            .unwrap_or(0)
    }

    /// Checks if a live key exists
    pub fn has_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.get(key).is_some_and(|e| e.is_live(now)))
            .unwrap_or(false)
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

/// Looks up a live entry, dropping it first if it has expired
fn live<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: Instant,
) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn list_mut<'a>(entry: &'a mut Entry, key: &str) -> Result<&'a mut Vec<String>, StoreError> {
    match &mut entry.value {
        Value::List(items) => Ok(items),
        Value::Text(_) => Err(StoreError::WrongType(key.to_string())),
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries()?;
        match live(&mut entries, key, Instant::now()) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => Ok(Some(text.clone())),
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries()?.insert(
            key.to_string(),
            Entry {
                value: Value::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries()?;
        match live(&mut entries, key, Instant::now()) {
            Some(Entry {
                value: Value::Text(text),
                ..
            }) => {
                *text = value.to_string();
                Ok(true)
            }
            Some(_) => Err(StoreError::WrongType(key.to_string())),
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries()?;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| entry.is_live(now))
            .count();

        debug!(requested = keys.len(), removed, "Deleted keys from memory");
        Ok(removed as u64)
    }

    #[instrument(skip(self))]
    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries()?;
        Ok(match live(&mut entries, key, now) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(deadline),
                ..
            }) => KeyTtl::Expires(deadline.saturating_duration_since(now)),
        })
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries()?;
        match live(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Some(Instant::now() + ttl);
        self.entries()?.insert(
            key.to_string(),
            Entry {
                value: Value::List(Vec::new()),
                expires_at,
            },
        );
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError> {
        let mut entries = self.entries()?;
        let Some(entry) = live(&mut entries, key, Instant::now()) else {
            return Ok(None);
        };
        let items = list_mut(entry, key)?;
        items.push(value.to_string());
        Ok(Some(items.len()))
    }

    #[instrument(skip(self, value))]
    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError> {
        // Check and append happen under one lock acquisition
        let mut entries = self.entries()?;
        let Some(entry) = live(&mut entries, key, Instant::now()) else {
            return Ok(BoundedAppend::Missing);
        };
        let items = list_mut(entry, key)?;
        if items.len() >= max_len {
            return Ok(BoundedAppend::Full);
        }
        items.push(value.to_string());
        Ok(BoundedAppend::Appended(items.len()))
    }

    #[instrument(skip(self))]
    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        let mut entries = self.entries()?;
        match live(&mut entries, key, Instant::now()) {
            Some(entry) => Ok(Some(list_mut(entry, key)?.clone())),
            None => Ok(None),
        }
    }
}
