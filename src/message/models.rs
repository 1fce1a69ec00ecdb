use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored message (one JSON item in `messages:{room_id}`)
///
/// Immutable once appended. `token` identifies the author and is only ever
/// shown back to that author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub text: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub room_id: String,
    pub token: String,
}

impl Message {
    pub fn new(room_id: &str, token: &str, sender: String, text: String) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            sender,
            text,
            timestamp: Utc::now().timestamp_millis(),
            room_id: room_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Projection for one recipient: the token is kept only for its author
    pub fn view_for(&self, viewer_token: Option<&str>) -> MessageView {
        let own = viewer_token.is_some_and(|viewer| viewer == self.token);
        MessageView {
            id: self.id.clone(),
            sender: self.sender.clone(),
            text: self.text.clone(),
            timestamp: self.timestamp,
            room_id: self.room_id.clone(),
            token: own.then(|| self.token.clone()),
        }
    }

    /// Projection with every private field removed
    pub fn public_view(&self) -> MessageView {
        self.view_for(None)
    }
}

/// Message as returned to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
