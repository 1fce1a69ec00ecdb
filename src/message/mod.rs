// Public API - what other modules can use
pub use handlers::{list_messages, send_message};
pub use log::MessageLog;
pub use models::{Message, MessageView};
pub use service::MessageService;
pub use types::{MessagesResponse, SendMessageRequest, MAX_SENDER_LEN, MAX_TEXT_LEN};

// Internal modules
mod handlers;
mod log;
mod models;
mod service;
mod types;
