use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::{RoomKeys, RoomModel, ROOM_CAPACITY};
use crate::shared::AppError;
use crate::store::{BoundedAppend, KeyTtl, KeyValueStore};

/// Result of attempting to record a token in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitResult {
    /// Token was appended to the connected set
    Admitted,
    /// Token was already recorded
    AlreadyMember,
    /// Room already holds `ROOM_CAPACITY` tokens
    Full,
    /// Room does not exist or has expired
    RoomNotFound,
}

/// Owns the room lifecycle on top of the key-value store
pub struct RoomRegistry {
    store: Arc<dyn KeyValueStore>,
    room_ttl: Duration,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, room_ttl: Duration) -> Self {
        Self { store, room_ttl }
    }

    pub fn room_ttl(&self) -> Duration {
        self.room_ttl
    }

    /// Creates a room with an empty connected set and a fresh TTL
    ///
    /// Follower keys are written before the room record, so they never outlive
    /// it. If any write fails the partial keys are removed again.
    #[instrument(skip(self))]
    pub async fn create_room(&self) -> Result<RoomModel, AppError> {
        let room = RoomModel::new();
        let keys = RoomKeys::for_room(&room.id);
        let record =
            serde_json::to_string(&room).map_err(|e| AppError::Internal(e.to_string()))?;

        if let Err(e) = self.write_room(&keys, &record).await {
            warn!(room_id = %room.id, error = %e, "Room creation failed, discarding partial keys");
            if let Err(cleanup) = self.store.delete(&keys.all()).await {
                warn!(room_id = %room.id, error = %cleanup, "Failed to discard partial room keys");
            }
            return Err(e);
        }

        info!(room_id = %room.id, ttl_secs = self.room_ttl.as_secs(), "Room created");
        Ok(room)
    }

    async fn write_room(&self, keys: &RoomKeys, record: &str) -> Result<(), AppError> {
        self.store.list_create(&keys.connected, self.room_ttl).await?;
        self.store.list_create(&keys.messages, self.room_ttl).await?;
        self.store
            .set(&keys.history, "", Some(self.room_ttl))
            .await?;
        self.store
            .set(&keys.meta, record, Some(self.room_ttl))
            .await?;
        Ok(())
    }

    /// Reads the room record; `None` is the only expiry signal
    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let keys = RoomKeys::for_room(room_id);
        let Some(record) = self.store.get(&keys.meta).await? else {
            debug!(room_id = %room_id, "Room not found");
            return Ok(None);
        };

        serde_json::from_str(&record)
            .map(Some)
            .map_err(|e| AppError::Internal(format!("corrupt room record: {e}")))
    }

    /// Reads the room's remaining lifetime and realigns the follower keys to it
    #[instrument(skip(self))]
    pub async fn remaining_ttl(&self, room_id: &str) -> Result<Duration, AppError> {
        let keys = RoomKeys::for_room(room_id);

        let ttl = match self.store.ttl(&keys.meta).await? {
            KeyTtl::Missing => return Err(AppError::RoomNotFound),
            KeyTtl::Expires(ttl) => ttl,
            KeyTtl::Persistent => {
                // A room must never live forever; restore the expiry
                warn!(room_id = %room_id, "Room record had no expiry, restoring it");
                if !self.store.expire(&keys.meta, self.room_ttl).await? {
                    return Err(AppError::RoomNotFound);
                }
                self.room_ttl
            }
        };

        for key in keys.followers() {
            self.store.expire(key, ttl).await?;
        }

        debug!(room_id = %room_id, ttl_ms = ttl.as_millis() as u64, "Room TTL aligned");
        Ok(ttl)
    }

    /// Membership test; false when the room does not exist
    #[instrument(skip(self, token))]
    pub async fn is_token_connected(&self, room_id: &str, token: &str) -> Result<bool, AppError> {
        let keys = RoomKeys::for_room(room_id);
        Ok(self
            .store
            .list_range(&keys.connected)
            .await?
            .is_some_and(|tokens| tokens.iter().any(|t| t == token)))
    }

    /// Atomically records a token if the room has capacity left
    ///
    /// The capacity check and the append are one bounded-append store call,
    /// so concurrent admissions can never push the set past `ROOM_CAPACITY`.
    #[instrument(skip(self, token))]
    pub async fn admit_token(&self, room_id: &str, token: &str) -> Result<AdmitResult, AppError> {
        let keys = RoomKeys::for_room(room_id);

        match self.store.list_range(&keys.connected).await? {
            None => return Ok(AdmitResult::RoomNotFound),
            Some(tokens) if tokens.iter().any(|t| t == token) => {
                debug!(room_id = %room_id, "Token already connected");
                return Ok(AdmitResult::AlreadyMember);
            }
            Some(_) => {}
        }

        match self
            .store
            .list_append_bounded(&keys.connected, token, ROOM_CAPACITY)
            .await?
        {
            BoundedAppend::Appended(count) => {
                // A destroy that removed the record first wins over this admission
                if self.get_room(room_id).await?.is_none() {
                    debug!(room_id = %room_id, "Room vanished during admission");
                    return Ok(AdmitResult::RoomNotFound);
                }
                info!(room_id = %room_id, connected = count, "Token admitted");
                Ok(AdmitResult::Admitted)
            }
            BoundedAppend::Full => {
                debug!(room_id = %room_id, "Room is full");
                Ok(AdmitResult::Full)
            }
            BoundedAppend::Missing => Ok(AdmitResult::RoomNotFound),
        }
    }

    /// Deletes every key of the room; returns whether anything was removed
    ///
    /// Idempotent: destroying a missing room is not an error.
    #[instrument(skip(self))]
    pub async fn destroy_room(&self, room_id: &str) -> Result<bool, AppError> {
        let keys = RoomKeys::for_room(room_id);
        let removed = self.store.delete(&keys.all()).await?;

        if removed > 0 {
            info!(room_id = %room_id, removed, "Room destroyed");
        } else {
            debug!(room_id = %room_id, "Room already gone");
        }
        Ok(removed > 0)
    }
}
