// Key-value storage with per-key atomicity and native expiry.
//
// Everything the room core persists goes through the `KeyValueStore` trait so
// the admission and TTL logic can run against the in-memory store in tests and
// against Postgres in production.

// Public API - what other modules can use
pub use memory::InMemoryKeyValueStore;
pub use postgres::PostgresKeyValueStore;
pub use timeout::TimeoutKeyValueStore;

// Internal modules
mod memory;
mod postgres;
mod timeout;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("key {0} holds a different kind of value")]
    WrongType(String),
}

/// Remaining lifetime of a key as reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist (never written, deleted, or expired)
    Missing,
    /// Key exists without an expiry
    Persistent,
    /// Key exists and will expire after the given duration
    Expires(Duration),
}

/// Outcome of a capacity-checked list append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundedAppend {
    /// Value was appended, list now has this many items
    Appended(usize),
    /// List already held `max_len` items, nothing was written
    Full,
    /// List does not exist, nothing was written
    Missing,
}

/// Key-value store contract used by the room core
///
/// Every method is atomic with respect to the key(s) it touches. There are no
/// multi-key transactions; `delete` removes all given keys in one call.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a plain value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a plain value, replacing whatever the key held
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Overwrites an existing plain value, keeping its expiry; false if the key is missing
    ///
    /// Never creates the key and never extends its lifetime.
    async fn replace(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Deletes the given keys and returns how many live keys were removed
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Reads the remaining lifetime of a key
    async fn ttl(&self, key: &str) -> Result<KeyTtl, StoreError>;

    /// Sets the remaining lifetime of an existing key; false if the key is missing
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Creates (or resets) an empty list with the given lifetime
    async fn list_create(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Appends to an existing list; `None` if the list does not exist
    ///
    /// Never creates the list, so a deleted or expired list stays gone.
    async fn list_append(&self, key: &str, value: &str) -> Result<Option<usize>, StoreError>;

    /// Appends to an existing list only while it holds fewer than `max_len` items
    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: usize,
    ) -> Result<BoundedAppend, StoreError>;

    /// Reads a whole list in append order; `None` if the list does not exist
    async fn list_range(&self, key: &str) -> Result<Option<Vec<String>>, StoreError>;
}
