use serde::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::message::MessageView;

/// Events published on a room's channel
///
/// Events represent facts about things that have already happened. On the
/// wire they are `{"event": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "event", content = "data")]
pub enum RoomEvent {
    /// A message was appended; carries only its public fields (never the token)
    #[serde(rename = "chat.message")]
    #[strum(serialize = "chat.message")]
    MessageArrived(MessageView),

    /// The room was destroyed explicitly
    #[serde(rename = "chat.destroy")]
    #[strum(serialize = "chat.destroy")]
    RoomDestroyed {
        #[serde(rename = "isDestroyed")]
        is_destroyed: bool,
    },
}

impl RoomEvent {
    pub fn destroyed() -> Self {
        RoomEvent::RoomDestroyed { is_destroyed: true }
    }

    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Whether no further events will follow on this room's channel
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoomEvent::RoomDestroyed { .. })
    }
}
