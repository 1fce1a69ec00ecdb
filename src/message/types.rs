use serde::{Deserialize, Serialize};

use super::models::MessageView;
use crate::shared::AppError;

pub const MAX_SENDER_LEN: usize = 100;
pub const MAX_TEXT_LEN: usize = 1000;

/// Request payload for posting a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender: String,
    pub text: String,
}

impl SendMessageRequest {
    /// Checks both fields are non-blank and within their length limits
    pub fn validate(&self) -> Result<(), AppError> {
        check_field("sender", &self.sender, MAX_SENDER_LEN)?;
        check_field("text", &self.text, MAX_TEXT_LEN)
    }
}

fn check_field(name: &str, value: &str, max_chars: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{name} must not be empty")));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::InvalidInput(format!(
            "{name} must be at most {max_chars} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
}
