use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::shared::AppError;

/// Maximum number of participants a room admits
pub const ROOM_CAPACITY: usize = 2;

/// Lifetime of a freshly created room
pub const DEFAULT_ROOM_TTL: Duration = Duration::from_secs(10 * 60);

const MAX_IDENTIFIER_LEN: usize = 64;

/// Stored room record (`meta:{room_id}`)
///
/// Its presence in the store is the only signal that the room is alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomModel {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new room model with a random, collision-resistant ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            created_at: Utc::now(),
        }
    }
}

impl Default for RoomModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Store keys belonging to one room
#[derive(Debug, Clone)]
pub struct RoomKeys {
    /// Room record, carries the authoritative TTL
    pub meta: String,
    /// Admitted tokens in admission order
    pub connected: String,
    /// Message history in append order
    pub messages: String,
    /// Housekeeping marker holding the last appended message id
    pub history: String,
}

impl RoomKeys {
    pub fn for_room(room_id: &str) -> Self {
        Self {
            meta: format!("meta:{room_id}"),
            connected: format!("connected:{room_id}"),
            messages: format!("messages:{room_id}"),
            history: format!("history:{room_id}"),
        }
    }

    /// Keys whose TTL follows the room record
    pub fn followers(&self) -> [&str; 3] {
        [&self.connected, &self.messages, &self.history]
    }

    pub fn all(&self) -> Vec<String> {
        vec![
            self.meta.clone(),
            self.connected.clone(),
            self.messages.clone(),
            self.history.clone(),
        ]
    }
}

/// Checks that a room id or token is 1-64 chars of `[A-Za-z0-9_-]`
pub fn validate_identifier(kind: &str, value: &str) -> Result<(), AppError> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("malformed {kind}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_room_ids_are_unique_and_valid() {
        let a = RoomModel::new();
        let b = RoomModel::new();

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert!(validate_identifier("room id", &a.id).is_ok());
    }

    #[test]
    fn test_room_record_round_trips_as_camel_case() {
        let room = RoomModel::new();
        let json = serde_json::to_string(&room).unwrap();
        assert!(json.contains("createdAt"));

        let parsed: RoomModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, room);
    }

    #[test]
    fn test_keys_are_scoped_to_room() {
        let keys = RoomKeys::for_room("abc");
        assert_eq!(keys.meta, "meta:abc");
        assert_eq!(keys.followers(), ["connected:abc", "messages:abc", "history:abc"]);
        assert_eq!(keys.all().len(), 4);
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("semi;colon")]
    #[case("emoji-\u{1F600}")]
    #[case(&"x".repeat(65))]
    fn test_malformed_identifiers_are_rejected(#[case] value: &str) {
        assert!(matches!(
            validate_identifier("token", value),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[rstest]
    #[case("a")]
    #[case("Room_42-x")]
    #[case(&"x".repeat(64))]
    fn test_well_formed_identifiers_are_accepted(#[case] value: &str) {
        assert!(validate_identifier("token", value).is_ok());
    }
}
