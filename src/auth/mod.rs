// Public API - what other modules can use
pub use middleware::{room_auth, RoomAuth, RoomQuery};
pub use token::{
    token_cookie, token_from_headers, RandomTokenGenerator, TokenGenerator, TOKEN_COOKIE,
};

// Internal modules
mod middleware;
mod token;
