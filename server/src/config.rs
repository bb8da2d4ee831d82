//! Server configuration.
//!
//! DESIGN
//! ======
//! Every knob is an environment variable with a built-in default, loaded once
//! at startup (after `.env` via `dotenvy`). Numeric values that are missing or
//! fail to parse fall back to their defaults; only a malformed bind address
//! is an error, since silently listening on the wrong interface is worse
//! than refusing to start.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3020;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_ROOM_IDLE_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_CHAT_DIR: &str = "temp/chats";
const DEFAULT_CLIENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR {value:?}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    /// How long an empty room stays listed before it is deactivated.
    pub room_idle_timeout: Duration,
    /// Directory holding one chat transcript file per room.
    pub chat_dir: PathBuf,
    /// Outbound queue depth per connection; events beyond it are dropped.
    pub client_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            room_idle_timeout: Duration::from_secs(DEFAULT_ROOM_IDLE_TIMEOUT_SECS),
            chat_dir: PathBuf::from(DEFAULT_CHAT_DIR),
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BindAddr`] if `BIND_ADDR` is not an IP address.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = raw_bind
            .parse()
            .map_err(|source| ConfigError::BindAddr { value: raw_bind.clone(), source })?;

        Ok(Self {
            port: env_parse("PORT", DEFAULT_PORT),
            bind_addr,
            room_idle_timeout: Duration::from_secs(env_parse("ROOM_IDLE_TIMEOUT_SECS", DEFAULT_ROOM_IDLE_TIMEOUT_SECS)),
            chat_dir: std::env::var("CHAT_DIR").map_or_else(|_| PathBuf::from(DEFAULT_CHAT_DIR), PathBuf::from),
            client_queue_capacity: env_parse("CLIENT_QUEUE_CAPACITY", DEFAULT_CLIENT_QUEUE_CAPACITY).max(1),
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Parse `key` from the environment, falling back to `default` when the
/// variable is absent or does not parse.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
