use serde::{Deserialize, Serialize};

/// Response for room creation
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
}

/// Response for a successful join; the token is also set as a cookie
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    pub room_id: String,
    pub token: String,
}

/// Remaining room lifetime in whole seconds
#[derive(Debug, Serialize, Deserialize)]
pub struct TtlResponse {
    pub ttl: u64,
}
