// Public API
pub use handler::realtime_handler;
pub use socket::{Connection, SocketError, SocketWrapper};

// Internal modules
mod handler;
mod socket;
