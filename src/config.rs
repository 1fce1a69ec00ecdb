use std::time::Duration;
use tracing::warn;

use crate::room::models::DEFAULT_ROOM_TTL;

/// Runtime configuration, read from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub room_ttl: Duration,
    pub store_timeout: Duration,
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            room_ttl: DEFAULT_ROOM_TTL,
            store_timeout: Duration::from_millis(2000),
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; malformed values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            room_ttl: parse_positive(&lookup, "ROOM_TTL_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.room_ttl),
            store_timeout: parse_positive(&lookup, "STORE_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        }
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(key, value = %raw, "Ignoring invalid config value, using default");
            None
        }
    }
}
